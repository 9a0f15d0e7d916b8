#[cfg(test)]
mod tests {
	use mockito::{Matcher, Server};
	use open_cloud_client::client::OpenCloudClient;
	use open_cloud_client::config::ClientConfig;
	use open_cloud_client::error::{OpenCloudError, ValidationError};
	use open_cloud_client::http::{RequestBody, RequestOptions, RequestOutcome};
	use open_cloud_client::reqwest::{Client, StatusCode};
	use open_cloud_client::types::GetEntryRequest;
	use serde_json::json;
	use std::net::TcpListener;
	use std::time::Duration;

	const ENTRY_ENDPOINT: &'static str =
		"/datastores/v1/universes/123/standard-datastores/datastore/entries/entry";
	const LOCAL_DOMAIN: &'static str = "127.0.0.1";

	fn client_for(server: &Server, config: ClientConfig) -> OpenCloudClient {
		OpenCloudClient::from_client(&server.url(), LOCAL_DOMAIN, Client::new(), config)
	}

	#[tokio::test]
	async fn test_get_entry() {
		// Spin-up mock server with mock response for given request.
		let mut server = Server::new_async().await;

		// Register the mock endpoint with the mockito server.
		let mock_server = server
			.mock("GET", ENTRY_ENDPOINT)
			.match_query(Matcher::AllOf(vec![
				Matcher::UrlEncoded("datastoreName".into(), "Players".into()),
				Matcher::UrlEncoded("entryKey".into(), "User_1".into()),
			]))
			.match_header("x-api-key", "secret")
			.with_status(200)
			.with_header("roblox-entry-version", "v1")
			.with_header("last-modified", "2023-01-01")
			.with_header("content-md5", "abc123")
			.with_header("roblox-entry-userids", "[1]")
			.with_body(r#"{"coins": 50}"#)
			.create_async()
			.await;

		let client = client_for(&server, ClientConfig::with_api_key("secret"));
		let entry = client.get_entry(&GetEntryRequest::new(123u64, "Players", "User_1")).await.unwrap();

		assert_eq!(entry.data, json!({ "coins": 50 }));
		assert_eq!(entry.version.as_deref(), Some("v1"));
		assert_eq!(entry.md5.as_deref(), Some("abc123"));
		assert_eq!(entry.last_modified.as_deref(), Some("2023-01-01"));
		assert_eq!(entry.user_ids, vec![1]);
		assert!(entry.attributes.is_empty());

		// Verify server endpoint was called exactly once.
		mock_server.assert_async().await;
	}

	#[tokio::test]
	async fn test_get_entry_with_scope_and_api_key_override() {
		let mut server = Server::new_async().await;
		let mock_server = server
			.mock("GET", ENTRY_ENDPOINT)
			.match_query(Matcher::AllOf(vec![
				Matcher::UrlEncoded("datastoreName".into(), "Players".into()),
				Matcher::UrlEncoded("entryKey".into(), "User_1".into()),
				Matcher::UrlEncoded("scope".into(), "season 2".into()),
			]))
			.match_header("x-api-key", "per-call")
			.with_status(200)
			.with_body("plain")
			.create_async()
			.await;

		let client = client_for(&server, ClientConfig::with_api_key("secret"));
		let request = GetEntryRequest::new("123", "Players", "User_1").with_scope("season 2").with_api_key("per-call");
		let entry = client.get_entry(&request).await.unwrap();
		assert_eq!(entry.data, json!("plain"));

		mock_server.assert_async().await;
	}

	#[tokio::test]
	async fn test_get_entry_reads_latest_config() {
		let mut server = Server::new_async().await;
		let mock_server = server
			.mock("GET", ENTRY_ENDPOINT)
			.match_query(Matcher::Any)
			.match_header("x-api-key", "rotated")
			.with_status(200)
			.with_body("1")
			.create_async()
			.await;

		let client = client_for(&server, ClientConfig::with_api_key("stale"));
		client.clone().set_config(ClientConfig::with_api_key("rotated"));
		let entry = client.get_entry(&GetEntryRequest::new(123u64, "Players", "User_1")).await.unwrap();
		assert_eq!(entry.data, json!(1));

		mock_server.assert_async().await;
	}

	#[tokio::test]
	async fn test_empty_api_key_falls_back_to_config() {
		let mut server = Server::new_async().await;
		let mock_server = server
			.mock("GET", ENTRY_ENDPOINT)
			.match_query(Matcher::Any)
			.match_header("x-api-key", "cfg")
			.with_status(200)
			.with_body("1")
			.create_async()
			.await;

		let client = client_for(&server, ClientConfig::with_api_key("cfg"));
		let request = GetEntryRequest::new(123u64, "Players", "User_1").with_api_key("");
		let entry = client.get_entry(&request).await.unwrap();
		assert_eq!(entry.data, json!(1));

		mock_server.assert_async().await;
	}

	#[tokio::test]
	async fn test_get_entry_not_found() {
		let mut server = Server::new_async().await;
		let mock_server = server.mock("GET", Matcher::Any).with_status(404).create_async().await;

		let client = client_for(&server, ClientConfig::with_api_key("secret"));
		let err = client.get_entry(&GetEntryRequest::new(123u64, "Players", "User_1")).await.unwrap_err();

		assert!(matches!(err, OpenCloudError::HttpStatus { .. }));
		assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
		assert_eq!(err.to_string(), "Not Found");

		mock_server.assert_async().await;
	}

	#[tokio::test]
	async fn test_get_entry_malformed_metadata() {
		let mut server = Server::new_async().await;
		let _mock_server = server
			.mock("GET", ENTRY_ENDPOINT)
			.match_query(Matcher::Any)
			.with_status(200)
			.with_header("roblox-entry-attributes", "not json")
			.with_body("{}")
			.create_async()
			.await;

		let client = client_for(&server, ClientConfig::with_api_key("secret"));
		let err = client.get_entry(&GetEntryRequest::new(123u64, "Players", "User_1")).await.unwrap_err();
		assert!(matches!(err, OpenCloudError::MalformedResponse(_)));
	}

	#[tokio::test]
	async fn test_get_entry_validation_precedes_network() {
		let mut server = Server::new_async().await;
		let mock_server = server.mock("GET", Matcher::Any).expect(0).create_async().await;

		let client = client_for(&server, ClientConfig::with_api_key("secret"));
		for (request, field) in [
			(GetEntryRequest::new("", "Players", "User_1"), "universe_id"),
			(GetEntryRequest::new(123u64, "", "User_1"), "datastore_name"),
			(GetEntryRequest::new(123u64, "Players", ""), "entry_key"),
		] {
			let err = client.get_entry(&request).await.unwrap_err();
			assert!(matches!(
				err,
				OpenCloudError::InvalidRequest(ValidationError::MissingField(missing)) if missing == field
			));
		}

		// A client whose endpoint lies outside its allowed domain never sends anything.
		let foreign = OpenCloudClient::from_client(&server.url(), "roblox.com", Client::new(), ClientConfig::default());
		let err = foreign.get_entry(&GetEntryRequest::new(123u64, "Players", "User_1")).await.unwrap_err();
		assert!(matches!(err, OpenCloudError::InvalidRequest(ValidationError::ForeignDomain { .. })));

		mock_server.assert_async().await;
	}

	#[tokio::test]
	async fn test_status_classification() {
		let mut server = Server::new_async().await;
		let client = client_for(&server, ClientConfig::default());
		let url = format!("{}/status", server.url());

		for status in [200, 201, 204, 299, 300, 400, 404, 429, 500, 503] {
			let mock_server = server.mock("GET", "/status").with_status(status).create_async().await;
			let success = (200..=299).contains(&status);

			let outcome = client.http().request(&url, &RequestOptions::new("GET"), None).await;
			match outcome {
				Ok(RequestOutcome::Response(response)) => {
					assert!(success, "status {} resolved", status);
					assert_eq!(response.status.as_u16(), status as u16);
				},
				Err(OpenCloudError::HttpStatus { status: actual, .. }) => {
					assert!(!success, "status {} rejected", status);
					assert_eq!(actual.as_u16(), status as u16);
				},
				other => panic!("unexpected outcome for status {}: {:?}", status, other),
			}

			let options = RequestOptions::new("GET").resolve_with_boolean(true);
			let outcome = client.http().request(&url, &options, None).await.unwrap();
			assert!(matches!(outcome, RequestOutcome::Boolean(b) if b == success), "status {}", status);

			// Dropping the mock unregisters it before the next status is mocked.
			drop(mock_server);
		}
	}

	#[tokio::test]
	async fn test_body_and_headers_forwarded() {
		let mut server = Server::new_async().await;
		let mock_server = server
			.mock("POST", "/entries")
			.match_header("content-type", "text/plain")
			.match_header("x-api-key", Matcher::Missing)
			.match_header("x-trace", "abc")
			.match_body(Matcher::Json(json!({ "coins": 50 })))
			.with_status(201)
			.create_async()
			.await;

		let client = client_for(&server, ClientConfig::with_api_key("secret"));
		let options = RequestOptions::new("POST").with_header("Content-Type", "text/plain").with_header("x-trace", "abc");
		let body = RequestBody::from(json!({ "coins": 50 }));
		let outcome = client.http().request(&format!("{}/entries", server.url()), &options, Some(body)).await.unwrap();
		assert_eq!(outcome.into_response().unwrap().status, StatusCode::CREATED);

		mock_server.assert_async().await;
	}

	#[tokio::test]
	async fn test_cancellation() {
		let mut server = Server::new_async().await;
		let mock_server = server.mock("GET", Matcher::Any).expect(0).create_async().await;
		let client = client_for(&server, ClientConfig::with_api_key("secret"));

		let request = GetEntryRequest::new(123u64, "Players", "User_1");
		let err = client.get_entry_with_cancellation(&request, std::future::ready(())).await.unwrap_err();
		assert!(matches!(err, OpenCloudError::Cancelled));

		// Cancellation is reported as such even in boolean mode.
		let options = RequestOptions::new("GET").resolve_with_boolean(true);
		let prepared = client.http().prepare(&format!("{}/entries", server.url()), &options, None).unwrap();
		let err = prepared.send_with_cancellation(std::future::ready(())).await.unwrap_err();
		assert!(matches!(err, OpenCloudError::Cancelled));

		mock_server.assert_async().await;
	}

	#[tokio::test]
	async fn test_network_error() {
		// Nothing listens on port 1, so the connection is refused.
		let client = OpenCloudClient::from_client(
			"http://127.0.0.1:1",
			LOCAL_DOMAIN,
			Client::new(),
			ClientConfig::with_api_key("secret"),
		);

		let err = client.get_entry(&GetEntryRequest::new(123u64, "Players", "User_1")).await.unwrap_err();
		assert!(matches!(err, OpenCloudError::Transport(_)));

		let options = RequestOptions::new("GET").resolve_with_boolean(true);
		let outcome = client.http().request("http://127.0.0.1:1/entries", &options, None).await.unwrap();
		assert!(!outcome.as_bool());
	}

	#[tokio::test]
	async fn test_timeout() {
		// The listener accepts connections into its backlog but never answers.
		let listener = TcpListener::bind("127.0.0.1:0").unwrap();
		let base_url = format!("http://{}", listener.local_addr().unwrap());
		let client = OpenCloudClient::from_client(
			&base_url,
			LOCAL_DOMAIN,
			Client::new(),
			ClientConfig::with_api_key("secret").with_timeout(Duration::from_millis(200)),
		);

		let err = client.get_entry(&GetEntryRequest::new(123u64, "Players", "User_1")).await.unwrap_err();
		assert!(matches!(err, OpenCloudError::Timeout(_)));

		let options = RequestOptions::new("GET").resolve_with_boolean(true);
		let outcome = client.http().request(&format!("{}/entries", base_url), &options, None).await.unwrap();
		assert!(matches!(outcome, RequestOutcome::Boolean(false)));

		drop(listener);
	}
}
