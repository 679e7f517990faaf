// Unit tests for browser capabilities and kinds

use super::*;
use crate::types::ViewportSize;

fn chrome_args(caps: &serde_json::Map<String, Value>) -> Vec<String> {
    caps["goog:chromeOptions"]["args"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_browser_kind_from_str() {
    assert_eq!("chrome".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
    assert_eq!("Chromium".parse::<BrowserKind>().unwrap(), BrowserKind::Chrome);
    assert_eq!("FIREFOX".parse::<BrowserKind>().unwrap(), BrowserKind::Firefox);
    assert!("safari".parse::<BrowserKind>().is_err());
}

#[test]
fn test_driver_commands_and_ports() {
    assert_eq!(BrowserKind::Chrome.driver_command(), "chromedriver");
    assert_eq!(BrowserKind::Firefox.driver_command(), "geckodriver");
    assert_eq!(BrowserKind::Chrome.standard_port(), 9515);
    assert_eq!(BrowserKind::Firefox.standard_port(), 4444);
}

#[test]
fn test_chrome_capabilities_headless_maximized() {
    let config = BrowserConfig {
        kind: BrowserKind::Chrome,
        headless: true,
        viewport: None,
        webdriver_url: None,
    };
    let caps = capabilities(&config, Some(PathBuf::from("/tmp/profile")));
    let args = chrome_args(&caps);

    assert!(args.contains(&"--headless=new".to_string()));
    assert!(args.contains(&"--start-maximized".to_string()));
    assert!(args.contains(&"--disable-notifications".to_string()));
    assert!(args.contains(&"--user-data-dir=/tmp/profile".to_string()));
}

#[test]
fn test_chrome_capabilities_visible_with_viewport() {
    let config = BrowserConfig {
        kind: BrowserKind::Chrome,
        headless: false,
        viewport: Some(ViewportSize {
            width: 1280,
            height: 800,
        }),
        webdriver_url: None,
    };
    let args = chrome_args(&capabilities(&config, None));

    assert!(!args.iter().any(|a| a.starts_with("--headless")));
    assert!(args.contains(&"--window-size=1280,800".to_string()));
    assert!(!args.contains(&"--start-maximized".to_string()));
}

#[test]
fn test_firefox_capabilities() {
    let config = BrowserConfig {
        kind: BrowserKind::Firefox,
        headless: true,
        viewport: Some(ViewportSize {
            width: 800,
            height: 600,
        }),
        webdriver_url: None,
    };
    let caps = capabilities(&config, None);
    assert!(caps.get("goog:chromeOptions").is_none());

    let args = caps["moz:firefoxOptions"]["args"].as_array().unwrap();
    assert_eq!(args[0], "--headless");
    assert_eq!(args[1], "--width=800");
    assert_eq!(args[2], "--height=600");
}
