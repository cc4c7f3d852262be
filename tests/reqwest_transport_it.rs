// std
use std::{fs, time::Duration as StdDuration};
// crates.io
use httpmock::prelude::*;
// self
use oauth2_rpc::{
	_preludet::*,
	auth::{AccessToken, DEFAULT_TOKEN_LIFETIME, TokenBlob},
	error::{AuthError, TransportError},
	http::JWT_BEARER_GRANT,
	message::RpcMessage,
	request::ACCEPT_VALUE,
	service::{ServiceDescriptor, ServiceOptions},
};

const SERVICE_ACCOUNT: &str = "rpc-tests@demo-project.iam.gserviceaccount.com";
const LOOKUP_PATH: &str = "/datastore/v1beta2/datasets/demo/lookup";

#[derive(Clone, PartialEq, prost::Message)]
struct LookupRequest {
	#[prost(string, repeated, tag = "1")]
	keys: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
struct LookupResponse {
	#[prost(string, repeated, tag = "1")]
	found: Vec<String>,
}

fn descriptor() -> ServiceDescriptor {
	ServiceDescriptor::builder("/datastore/v1beta2/datasets/demo")
		.method_path("lookup", "/lookup")
		.scope("https://www.googleapis.com/auth/datastore")
		.build()
		.expect("Descriptor should build for transport tests.")
}

fn options(server: &MockServer, cache: Option<&PathBuf>) -> ServiceOptions {
	options_for_host(&server.base_url(), server, cache)
}

fn options_for_host(host: &str, server: &MockServer, cache: Option<&PathBuf>) -> ServiceOptions {
	let mut builder = ServiceOptions::builder(Url::parse(host).expect("Host URL should parse."))
		.application_name("oauth2-rpc-it")
		.service_account(SERVICE_ACCOUNT, fixture_path("service_account_key.pem"))
		.client_id("client-7")
		.token_endpoint(Url::parse(&server.url("/token")).expect("Mock token URL should parse."));

	if let Some(path) = cache {
		builder = builder.auth_token_file(path);
	}

	builder.build().expect("Service-account options should validate.")
}

fn lookup_request() -> LookupRequest {
	LookupRequest { keys: vec!["Book:1".into()] }
}

fn lookup_reply() -> Vec<u8> {
	LookupResponse { found: vec!["Book:1".into()] }
		.to_bytes()
		.expect("Reply fixture should encode.")
		.to_vec()
}

#[tokio::test]
async fn negotiated_token_signs_calls_and_is_reused_from_the_cache() {
	let server = MockServer::start_async().await;
	let cache = temp_path("negotiate");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", JWT_BEARER_GRANT)
				.form_urlencoded_tuple("client_id", "client-7")
				.body_includes("assertion=ey");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"issued-token\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let body = lookup_request().to_bytes().expect("Request fixture should encode.");
	let rpc_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(LOOKUP_PATH)
				.header("authorization", "Bearer issued-token")
				.header("content-type", "application/x-protobuf")
				.header("accept", ACCEPT_VALUE)
				.header("accept-encoding", "gzip")
				.header("content-length", body.len().to_string())
				.header("user-agent", "oauth2-rpc-it")
				.body_includes("Book:1");
			then.status(200).body(lookup_reply());
		})
		.await;
	let client = build_reqwest_test_client(options(&server, Some(&cache)), descriptor());

	for _ in 0..2 {
		let reply = client
			.call("lookup", &lookup_request(), LookupResponse::default())
			.await
			.expect("Authenticated call should succeed.");

		assert_eq!(reply.found, vec!["Book:1".to_owned()]);
	}

	token_mock.assert_calls_async(1).await;
	rpc_mock.assert_calls_async(2).await;

	let cached = fs::read(&cache).expect("Token cache should have been written.");
	let token = AccessToken::from_blob(&TokenBlob::new(cached))
		.expect("Token cache should hold an access-token record.");

	assert_eq!(token.access_token.expose(), "issued-token");
	assert_eq!(token.expires_in, 3600);

	let _ = fs::remove_file(&cache);
}

#[tokio::test]
async fn valid_cached_token_skips_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let cache = temp_path("cached");
	let cached =
		AccessToken::bearer("cached-token", DEFAULT_TOKEN_LIFETIME, OffsetDateTime::now_utc())
			.to_blob()
			.expect("Cached token should encode.");

	fs::write(&cache, cached.expose()).expect("Token cache fixture should be written.");

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(500);
		})
		.await;
	let rpc_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(LOOKUP_PATH).header("authorization", "Bearer cached-token");
			then.status(200).body(lookup_reply());
		})
		.await;
	let client = build_reqwest_test_client(options(&server, Some(&cache)), descriptor());

	client
		.call("lookup", &lookup_request(), LookupResponse::default())
		.await
		.expect("Call with a cached token should succeed.");

	token_mock.assert_calls_async(0).await;
	rpc_mock.assert_calls_async(1).await;

	assert_eq!(fs::read(&cache).expect("Token cache should remain."), cached.expose());

	let _ = fs::remove_file(&cache);
}

#[tokio::test]
async fn expired_cached_token_is_renegotiated() {
	let server = MockServer::start_async().await;
	let cache = temp_path("expired");
	let expired = AccessToken::bearer(
		"expired-token",
		DEFAULT_TOKEN_LIFETIME,
		OffsetDateTime::now_utc() - DEFAULT_TOKEN_LIFETIME,
	)
	.to_blob()
	.expect("Expired token should encode.");

	fs::write(&cache, expired.expose()).expect("Token cache fixture should be written.");

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"renewed-token\",\"token_type\":\"bearer\"}");
		})
		.await;
	let rpc_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(LOOKUP_PATH).header("authorization", "Bearer renewed-token");
			then.status(200).body(lookup_reply());
		})
		.await;
	let client = build_reqwest_test_client(options(&server, Some(&cache)), descriptor());

	client
		.call("lookup", &lookup_request(), LookupResponse::default())
		.await
		.expect("Call should succeed after renegotiation.");

	token_mock.assert_calls_async(1).await;
	rpc_mock.assert_calls_async(1).await;

	let renewed = AccessToken::from_blob(&TokenBlob::new(
		fs::read(&cache).expect("Token cache should have been rewritten."),
	))
	.expect("Token cache should hold an access-token record.");

	assert_eq!(renewed.access_token.expose(), "renewed-token");

	let _ = fs::remove_file(&cache);
}

#[tokio::test]
async fn token_endpoint_rejection_is_an_auth_error() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let rpc_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(LOOKUP_PATH);
			then.status(200);
		})
		.await;
	let client = build_reqwest_test_client(options(&server, None), descriptor());
	let err = client
		.call("lookup", &lookup_request(), LookupResponse::default())
		.await
		.expect_err("Rejected assertions must fail the call.");

	match err {
		Error::Auth(AuthError::TokenEndpoint { status, body }) => {
			assert_eq!(status, 400);
			assert_eq!(body.as_ref(), b"{\"error\":\"invalid_grant\"}");
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	token_mock.assert_calls_async(1).await;
	rpc_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn anonymous_call_reports_http_errors_verbatim() {
	let server = MockServer::start_async().await;
	let rpc_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/ping");
			then.status(404).body("no such method");
		})
		.await;
	let options = ServiceOptions::builder(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
	)
	.build()
	.expect("Anonymous options should validate.");
	let descriptor = ServiceDescriptor::builder("/v1/")
		.method_path("Ping", "/ping")
		.build()
		.expect("Descriptor should build.");
	let client = build_reqwest_test_client(options, descriptor);
	let err = client
		.call("Ping", &lookup_request(), LookupResponse::default())
		.await
		.expect_err("A 404 reply must fail.");

	match err {
		Error::Rpc(rpc) => {
			assert_eq!(rpc.code(), 404);
			assert_eq!(rpc.body().as_ref(), b"no such method");
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	rpc_mock.assert_async().await;
}

#[tokio::test]
async fn out_of_range_cached_token_is_renegotiated_instead_of_crashing() {
	let server = MockServer::start_async().await;
	let cache = temp_path("out_of_range");

	fs::write(
		&cache,
		br#"{"access_token":"ancient","token_type":"bearer","expires_in":-377705116800,"created":0}"#,
	)
	.expect("Token cache fixture should be written.");

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"sane-token\",\"token_type\":\"bearer\"}");
		})
		.await;
	let rpc_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(LOOKUP_PATH).header("authorization", "Bearer sane-token");
			then.status(200).body(lookup_reply());
		})
		.await;
	let client = build_reqwest_test_client(options(&server, Some(&cache)), descriptor());

	client
		.call("lookup", &lookup_request(), LookupResponse::default())
		.await
		.expect("A nonsensical cache record must only force renegotiation.");

	token_mock.assert_calls_async(1).await;
	rpc_mock.assert_calls_async(1).await;

	let _ = fs::remove_file(&cache);
}

#[tokio::test]
async fn network_failure_leaves_the_cache_unwritten() {
	let server = MockServer::start_async().await;
	let cache = temp_path("network_failure");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"unused-token\",\"token_type\":\"bearer\"}");
		})
		.await;
	let client = build_reqwest_test_client(
		options_for_host("http://127.0.0.1:1", &server, Some(&cache)),
		descriptor(),
	);
	let err = client
		.call("lookup", &lookup_request(), LookupResponse::default())
		.await
		.expect_err("An unreachable host must fail.");

	assert!(matches!(err, Error::Transport(TransportError::Network { target: "rpc", .. })));

	token_mock.assert_calls_async(1).await;

	assert!(!cache.exists(), "Tokens from failed calls must not be cached.");
}

#[tokio::test]
async fn gzip_replies_are_decoded() {
	// `LookupResponse { found: ["Book:1"] }`, gzip-compressed.
	const GZIPPED_REPLY: &[u8] = &[
		0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0xe3, 0x62, 0x73, 0xca, 0xcf,
		0xcf, 0xb6, 0x32, 0x04, 0x00, 0xb7, 0xa0, 0x70, 0x9d, 0x08, 0x00, 0x00, 0x00,
	];

	let server = MockServer::start_async().await;
	let rpc_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/lookup").header("accept-encoding", "gzip");
			then.status(200).header("content-encoding", "gzip").body(GZIPPED_REPLY);
		})
		.await;
	let options = ServiceOptions::builder(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
	)
	.build()
	.expect("Anonymous options should validate.");
	let descriptor = ServiceDescriptor::builder("/v1").build().expect("Descriptor should build.");
	let client = build_reqwest_test_client(options, descriptor);
	let reply = client
		.call("lookup", &lookup_request(), LookupResponse::default())
		.await
		.expect("Compressed replies should decode.");

	assert_eq!(reply.found, vec!["Book:1".to_owned()]);

	rpc_mock.assert_async().await;
}

#[tokio::test]
async fn slow_replies_hit_the_configured_timeout() {
	let server = MockServer::start_async().await;
	let rpc_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/lookup");
			then.status(200).body(lookup_reply()).delay(StdDuration::from_secs(3));
		})
		.await;
	let options = ServiceOptions::builder(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
	)
	.timeout(StdDuration::from_millis(200))
	.build()
	.expect("Anonymous options should validate.");
	let descriptor = ServiceDescriptor::builder("/v1").build().expect("Descriptor should build.");
	let client = build_reqwest_test_client(options, descriptor);
	let err = client
		.call("lookup", &lookup_request(), LookupResponse::default())
		.await
		.expect_err("Replies slower than the timeout must fail.");

	assert!(matches!(err, Error::Transport(TransportError::Network { target: "rpc", .. })));

	rpc_mock.assert_async().await;
}
