#[cfg(test)]
mod tests {
    use crate::commands::utils;
    use crate::types::*;

    #[test]
    fn test_output_format_variants() {
        let json_format = OutputFormat::Json;
        assert!(matches!(json_format, OutputFormat::Json));

        let simple_format = OutputFormat::Simple;
        assert!(matches!(simple_format, OutputFormat::Simple));
    }

    #[test]
    fn test_print_result_simple_uses_renderer() {
        // Simple format prints the rendered line; the closure must be usable
        let value = serde_json::json!({ "count": 2 });
        let result = utils::print_result(OutputFormat::Simple, &value, || "2 fields".to_string());
        assert!(result.is_ok());
    }

    #[test]
    fn test_print_result_json_serializes() {
        let value = serde_json::json!({ "ok": true });
        let result = utils::print_result(OutputFormat::Json, &value, || unreachable!());
        assert!(result.is_ok());
    }

    #[test]
    fn test_browser_type_parsing() {
        use crate::browser::BrowserType;

        assert!(matches!(
            "firefox".parse::<BrowserType>().unwrap(),
            BrowserType::Firefox
        ));
        assert!(matches!(
            "chrome".parse::<BrowserType>().unwrap(),
            BrowserType::Chrome
        ));
        assert!("safari".parse::<BrowserType>().is_err());
    }

    #[test]
    fn test_viewport_flag_parsing() {
        let v = ViewportSize::parse("1280x720").unwrap();
        assert_eq!(v.width, 1280);
        assert_eq!(v.height, 720);
    }
}
