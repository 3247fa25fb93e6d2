//! CLI output formatting tests.
//!
//! These tests verify the table and JSON renderings of result sets and
//! crumb reports.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::json::{AttemptOutput, CrumbReport};
    use super::super::text::TextFormatter;
    use chrono::{NaiveDate, TimeZone};
    use earncal_core::{EarningsRecord, ResultSet, EASTERN};
    use earncal_store::Config;
    use std::path::Path;

    fn sample() -> ResultSet {
        let apple = EarningsRecord {
            symbol: Some("AAPL".to_string()),
            company: Some("Apple Inc.".to_string()),
            report_time: EASTERN.with_ymd_and_hms(2024, 4, 5, 16, 30, 0).single(),
            eps_estimate: Some(1.5),
            market_cap: Some(2_500_000_000_000.0),
            ..EarningsRecord::default()
        };
        let other = EarningsRecord {
            symbol: Some("XYZ".to_string()),
            ..EarningsRecord::default()
        };
        ResultSet::new(Vec::new(), vec![apple, other])
    }

    fn report(success: bool) -> CrumbReport {
        CrumbReport {
            date: NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
            success,
            strategy: success.then(|| "yahoo.inline_script".to_string()),
            cookie_name: success.then(|| "A3".to_string()),
            crumb_length: success.then_some(11),
            crumb: None,
            attempts: vec![
                AttemptOutput {
                    strategy: "yahoo.cookie_crumb".to_string(),
                    kind: "Cookie Endpoint".to_string(),
                    success: false,
                    error: Some("Rate limited by crumb endpoint".to_string()),
                    duration_ms: 12,
                },
                AttemptOutput {
                    strategy: "yahoo.inline_script".to_string(),
                    kind: "Inline Script".to_string(),
                    success,
                    error: (!success).then(|| "Not found in calendar page".to_string()),
                    duration_ms: 40,
                },
            ],
            error: (!success).then(|| "all 2 crumb strategies failed".to_string()),
            duration_ms: 52,
        }
    }

    #[test]
    fn test_table_header_and_rows() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_results(&sample());
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("Company"));
        assert!(lines[0].contains("Earnings Call Time"));
        assert!(lines[0].ends_with("Time Type"));
        assert!(lines[1].starts_with('─'));
        assert!(lines[2].starts_with("Apple Inc."));
        assert!(lines[2].contains("2024-04-05T16:30:00-04:00"));
        assert!(lines[2].contains("2500000000000"));
        assert!(output.ends_with("2 events"));
    }

    #[test]
    fn test_missing_values_render_as_dash() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_results(&sample());
        let row = output.lines().nth(3).unwrap();
        assert!(row.starts_with('-'));
        assert!(row.contains("XYZ"));
    }

    #[test]
    fn test_columns_are_aligned() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_results(&sample());
        let lines: Vec<&str> = output.lines().collect();

        let symbol_at = lines[0].find("Symbol").unwrap();
        assert_eq!(lines[2].find("AAPL"), Some(symbol_at));
        assert_eq!(lines[3].find("XYZ"), Some(symbol_at));
    }

    #[test]
    fn test_empty_result_keeps_header() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_results(&ResultSet::empty());
        assert!(output.starts_with("Company"));
        assert!(output.contains("No earnings events found"));
    }

    #[test]
    fn test_no_colors_means_no_escapes() {
        let formatter = TextFormatter::new(false);
        assert!(!formatter.format_results(&sample()).contains('\x1b'));
        assert!(!formatter.format_crumb_report(&report(true)).contains('\x1b'));
    }

    #[test]
    fn test_colored_header_is_bold() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.format_results(&sample()).starts_with("\x1b[1m"));
    }

    #[test]
    fn test_crumb_report_success() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_crumb_report(&report(true));

        assert!(output.starts_with("Crumb chain for 2024-04-05"));
        assert!(output.contains("✗ yahoo.cookie_crumb"));
        assert!(output.contains("Rate limited by crumb endpoint"));
        assert!(output.contains("✓ yahoo.inline_script"));
        assert!(output.contains("Credential: complete via yahoo.inline_script (cookie A3, crumb 11 chars)"));
        assert!(!output.contains("Crumb:"));
    }

    #[test]
    fn test_crumb_report_failure() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_crumb_report(&report(false));
        assert!(output.contains("Credential: all 2 crumb strategies failed"));
    }

    #[test]
    fn test_crumb_report_reveals_crumb_on_request() {
        let formatter = TextFormatter::new(false);
        let mut report = report(true);
        report.crumb = Some("Xy1.Z9abcde".to_string());
        assert!(formatter.format_crumb_report(&report).contains("Crumb: Xy1.Z9abcde"));
    }

    #[test]
    fn test_config_output() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_config(&Config::default(), Path::new("/tmp/earncal.json"));

        assert!(output.contains("/tmp/earncal.json"));
        assert!(output.contains("Timeout:       30s"));
        assert!(output.contains("Region:        us"));
        assert!(!output.contains("Endpoint overrides"));
    }

    #[test]
    fn test_config_output_lists_overrides() {
        let formatter = TextFormatter::new(false);
        let mut config = Config::default();
        config.yahoo.endpoints.base_url = Some("http://127.0.0.1:9000".to_string());

        let output = formatter.format_config(&config, Path::new("config.json"));
        assert!(output.contains("Endpoint overrides"));
        assert!(output.contains("http://127.0.0.1:9000/v1/test/getcrumb"));
    }
}

#[cfg(test)]
mod json_formatter_tests {
    use super::super::json::{CrumbReport, JsonFormatter};
    use chrono::NaiveDate;
    use earncal_core::{EarningsRecord, ResultSet};
    use earncal_fetch::{CrumbOutcome, FetchAttempt, FetchError};
    use std::time::Duration;

    #[test]
    fn test_compact_vs_pretty() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(JsonFormatter::new(false).format(&value).unwrap(), r#"{"a":1}"#);
        assert!(JsonFormatter::new(true).format(&value).unwrap().contains('\n'));
    }

    #[test]
    fn test_result_set_json() {
        let record = EarningsRecord {
            symbol: Some("AAPL".to_string()),
            eps_estimate: Some(1.5),
            ..EarningsRecord::default()
        };
        let set = ResultSet::new(Vec::new(), vec![record]);

        let output = JsonFormatter::new(false).format(&set).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["columns"].as_array().unwrap().len(), 9);
        assert_eq!(json["records"][0]["Symbol"], "AAPL");
        assert_eq!(json["records"][0]["EPS Estimate"], 1.5);
        assert!(json["records"][0]["Company"].is_null());
    }

    #[test]
    fn test_failed_crumb_report_json() {
        let attempts = vec![FetchAttempt::failure(
            "yahoo.cookie_crumb",
            earncal_fetch::CrumbSource::CookieEndpoint,
            "HTTP 500 from crumb endpoint",
            Duration::from_millis(25),
        )];
        let outcome = CrumbOutcome {
            result: Err(FetchError::authentication("crumb", "all 1 crumb strategies failed")),
            attempts,
            duration: Duration::from_millis(30),
        };
        let date = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();

        let report = CrumbReport::from_outcome(date, &outcome, true);
        let output = JsonFormatter::new(false).format(&report).unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(json["date"], "2024-04-05");
        assert_eq!(json["success"], false);
        assert!(json.get("strategy").is_none());
        assert!(json.get("crumb").is_none());
        assert_eq!(json["attempts"][0]["strategy"], "yahoo.cookie_crumb");
        assert_eq!(json["attempts"][0]["kind"], "Cookie Endpoint");
        assert_eq!(json["attempts"][0]["durationMs"], 25);
        assert_eq!(json["durationMs"], 30);
        assert!(json["error"].as_str().unwrap().contains("all 1 crumb strategies failed"));
    }
}
