//! End-to-end tests for the metadata resource on a scripted host

use ec2_instance_check::config::ConfigLoader;
use ec2_instance_check::fetch::{INVALID_PROPERTY, NO_HTTP_CLIENT};
use ec2_instance_check::host::OsFamily;
use ec2_instance_check::host::mock::MockHost;
use ec2_instance_check::{MetadataResource, SkipReason, Transport};
use serde_json::json;

// ==================== Construction ====================

/// No options on a host with curl: curl, latest, and the listing decides exists
#[tokio::test]
async fn test_empty_options_with_curl() {
    let host = MockHost::new()
        .with_command("curl")
        .with_response("http://169.254.169.254/latest/meta-data/", "ami-id\nhostname");
    let resource = MetadataResource::with_host(Some(&json!({})), host).await;

    assert_eq!(
        resource.transport(),
        &Transport::Curl {
            program: "curl".to_string()
        }
    );
    assert!(resource.exists().await);

    let invocation = &resource.host().invocations()[0];
    assert_eq!(
        invocation.to_string(),
        "curl --silent --fail --connect-timeout 2 http://169.254.169.254/latest/meta-data/"
    );
}

/// Pinned version and timeout on a host with only wget
#[tokio::test]
async fn test_pinned_version_with_wget() {
    let host = MockHost::new().with_command("wget");
    let options = json!({ "version": "2016-06-30", "timeout": 3 });
    let resource = MetadataResource::with_host(Some(&options), host).await;

    assert_eq!(resource.transport().name(), "wget");
    resource.get("meta-data/local-ipv4").await;

    let invocation = &resource.host().invocations()[0];
    assert_eq!(
        invocation.to_string(),
        "wget --quiet --connect-timeout 3 --output-document - \
         http://169.254.169.254/2016-06-30/meta-data/local-ipv4"
    );
}

/// A bad version skips before the host is touched
#[tokio::test]
async fn test_bad_version_is_skipped() {
    let host = MockHost::new().with_command("curl");
    let options = json!({ "version": "bad version!" });
    let resource = MetadataResource::with_host(Some(&options), host).await;

    assert!(resource.is_skipped());
    assert!(
        resource
            .skip_reason()
            .unwrap()
            .to_string()
            .contains("Invalid character in version")
    );
    assert!(resource.host().probes().is_empty());
    assert!(resource.host().invocations().is_empty());
}

/// Neither curl nor wget on a non-Windows host
#[tokio::test]
async fn test_no_http_client_is_skipped() {
    let host = MockHost::new().with_os_family(OsFamily::Other);
    let resource = MetadataResource::with_host(None, host).await;

    assert_eq!(resource.skip_reason(), Some(&SkipReason::NoHttpClient));
    assert_eq!(resource.host().probes(), vec!["curl", "wget"]);
    assert_eq!(resource.get("user-data").await, NO_HTTP_CLIENT);
}

/// Each option failure carries its own reason
#[tokio::test]
async fn test_skip_reasons() {
    let cases = [
        (json!({ "timeout": "soon" }), "timeout is not numeric"),
        (
            json!({ "curl_path": "/usr/bin/curl && id" }),
            "Invalid character in curl_path",
        ),
        (
            json!({ "wget_path": "`wget`" }),
            "Invalid character in wget_path",
        ),
        (json!(["curl_path", "/usr/bin/curl"]), "Unsupported parameter"),
    ];

    for (options, expected) in cases {
        let resource = MetadataResource::with_host(Some(&options), MockHost::new()).await;
        let reason = resource.skip_reason().expect("resource should be skipped");
        assert!(
            reason.to_string().contains(expected),
            "{} should mention {:?}",
            reason,
            expected
        );
    }
}

// ==================== Lookups ====================

/// Rejected property paths never reach a transport
#[tokio::test]
async fn test_rejected_properties() {
    let host = MockHost::new().with_command("curl");
    let resource = MetadataResource::with_host(None, host).await;

    for property in ["../etc/passwd", "meta;data", "user-data'", "a b"] {
        assert_eq!(resource.get(property).await, INVALID_PROPERTY);
    }
    assert!(resource.host().invocations().is_empty());
}

/// Arbitrary paths are fetched as given
#[tokio::test]
async fn test_open_ended_properties() {
    let base = "http://169.254.169.254/latest";
    let host = MockHost::new()
        .with_command("curl")
        .with_response(&format!("{}/meta-data/public-ipv4", base), "54.1.2.3")
        .with_response(
            &format!("{}/meta-data/iam/security-credentials/", base),
            "web-role",
        )
        .with_response(&format!("{}/user-data", base), "#!/bin/bash\necho hi\n");
    let resource = MetadataResource::with_host(None, host).await;

    assert_eq!(resource.get("meta-data/public-ipv4").await, "54.1.2.3");
    assert_eq!(
        resource.get("meta-data/iam/security-credentials/").await,
        "web-role"
    );
    assert!(!resource.get("user-data").await.contains("password"));
    assert_eq!(resource.get("meta-data/placement/region").await, "");
}

/// PowerShell on Windows returns only the response body
#[tokio::test]
async fn test_windows_powershell_body() {
    let host = MockHost::new()
        .with_os_family(OsFamily::Windows)
        .with_response(
            "http://169.254.169.254/latest/meta-data/",
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\nami-id\nhostname",
        );
    let resource = MetadataResource::with_host(None, host).await;

    assert_eq!(resource.transport(), &Transport::PowerShell);
    assert!(resource.exists().await);
    assert_eq!(resource.host().invocations()[0].program, "powershell");
}

/// Windows uses PowerShell even when curl.exe is on PATH, without probing
#[tokio::test]
async fn test_windows_ignores_installed_curl() {
    let host = MockHost::new()
        .with_os_family(OsFamily::Windows)
        .with_command("curl");
    let resource = MetadataResource::with_host(None, host).await;

    assert_eq!(resource.transport(), &Transport::PowerShell);
    assert!(resource.host().probes().is_empty());
}

// ==================== Options from files ====================

/// Options loaded from YAML flow through validation
#[tokio::test]
async fn test_loaded_options() {
    let options = ConfigLoader::new()
        .with_inline("version: '2016-06-30'\ncurl_path: /usr/bin/curl\n")
        .with_override("timeout", "4")
        .load()
        .await
        .unwrap();

    let host = MockHost::new().with_command("/usr/bin/curl");
    let resource = MetadataResource::with_host(options.as_ref(), host).await;

    let config = resource.config().unwrap();
    assert_eq!(config.version, "2016-06-30");
    assert_eq!(config.timeout_seconds, 4);
    assert_eq!(
        resource.transport(),
        &Transport::Curl {
            program: "/usr/bin/curl".to_string()
        }
    );
}
