use hallucheck_common::config::{RetryConfig, SystemConfig};

use super::loader::ConfigError;

/// Check ranges and cross-field constraints, reporting every violation at
/// once.
pub fn validate(config: &SystemConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_scoring(config, &mut errors);
    validate_risk(config, &mut errors);
    validate_verification(config, &mut errors);
    validate_services(config, &mut errors);
    validate_embeddings(config, &mut errors);
    validate_retry(&config.retry, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_scoring(config: &SystemConfig, errors: &mut Vec<String>) {
    let s = &config.scoring;
    for (name, weight) in [
        ("unverified_weight", s.unverified_weight),
        ("fake_citation_weight", s.fake_citation_weight),
        ("broken_link_weight", s.broken_link_weight),
    ] {
        if !weight.is_finite() || weight < 0.0 {
            errors.push(format!("scoring.{} must be a non-negative number", name));
        }
    }
}

fn validate_risk(config: &SystemConfig, errors: &mut Vec<String>) {
    let r = &config.risk;

    if !(0.0..=100.0).contains(&r.low_max) {
        errors.push("risk.low_max must be between 0 and 100".into());
    }
    if !(0.0..=100.0).contains(&r.medium_max) {
        errors.push("risk.medium_max must be between 0 and 100".into());
    }
    if r.low_max > r.medium_max {
        errors.push("risk.low_max must not exceed risk.medium_max".into());
    }
}

fn validate_verification(config: &SystemConfig, errors: &mut Vec<String>) {
    let v = &config.verification;

    if v.fact_concurrency == 0 {
        errors.push("verification.fact_concurrency must be > 0".into());
    }
    if v.max_evidence_results == 0 {
        errors.push("verification.max_evidence_results must be > 0".into());
    }
    if v.max_input_chars == 0 {
        errors.push("verification.max_input_chars must be > 0".into());
    }
}

fn validate_services(config: &SystemConfig, errors: &mut Vec<String>) {
    let s = &config.services;

    if s.user_agent.trim().is_empty() {
        errors.push("services.user_agent must not be empty".into());
    }
    if s.request_timeout_ms == 0 {
        errors.push("services.request_timeout_ms must be > 0".into());
    }
    if s.evidence_timeout_ms == 0 {
        errors.push("services.evidence_timeout_ms must be > 0".into());
    }
    if !s.rate_limit_per_second.is_finite() || s.rate_limit_per_second <= 0.0 {
        errors.push("services.rate_limit_per_second must be > 0".into());
    }

    let mut urls = vec![
        ("crossref_url", s.crossref_url.as_str()),
        ("semantic_scholar_url", s.semantic_scholar_url.as_str()),
        ("wikipedia_url", s.wikipedia_url.as_str()),
    ];
    if let Some(url) = &s.entailment_url {
        urls.push(("entailment_url", url.as_str()));
    }
    for (name, url) in urls {
        if reqwest::Url::parse(url).is_err() {
            errors.push(format!("services.{} is not a valid URL: {:?}", name, url));
        }
    }
}

fn validate_embeddings(config: &SystemConfig, errors: &mut Vec<String>) {
    let Some(e) = &config.embeddings else {
        return;
    };

    if reqwest::Url::parse(&e.endpoint).is_err() {
        errors.push(format!("embeddings.endpoint is not a valid URL: {:?}", e.endpoint));
    }
    if e.model.is_empty() {
        errors.push("embeddings.model must not be empty".into());
    }
    if e.dimensions == 0 {
        errors.push("embeddings.dimensions must be > 0".into());
    }
}

fn validate_retry(rc: &RetryConfig, errors: &mut Vec<String>) {
    if rc.max_attempts == 0 {
        errors.push("retry.max_attempts must be > 0".into());
    }
    if rc.initial_backoff_ms == 0 {
        errors.push("retry.initial_backoff_ms must be > 0".into());
    }
    if rc.max_backoff_ms < rc.initial_backoff_ms {
        errors.push("retry.max_backoff_ms must be >= initial_backoff_ms".into());
    }
    if rc.backoff_multiplier < 1.0 {
        errors.push("retry.backoff_multiplier must be >= 1.0".into());
    }
}
