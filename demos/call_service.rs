//! Calls a protobuf service as a service account against a local mock, caching the negotiated
//! token on disk so the second call skips the token endpoint.

// std
use std::path::PathBuf;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oauth2_rpc::{
	client::RpcClient,
	http::ReqwestTransport,
	message::RpcMessage,
	reqwest::Client,
	service::{ServiceDescriptor, ServiceOptions},
	url::Url,
};

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

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let reply = LookupResponse { found: vec!["Book:1".into()] }.to_bytes()?;
	let rpc_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/datastore/v1beta2/datasets/demo/lookup")
				.header("authorization", "Bearer demo-access");
			then.status(200).body(reply.to_vec());
		})
		.await;
	let fixtures = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
	let cache = std::env::temp_dir().join(format!("oauth2_rpc_demo_{}.json", std::process::id()));
	let options = ServiceOptions::builder(Url::parse(&server.base_url())?)
		.application_name("oauth2-rpc-demo")
		.service_account(
			"rpc-tests@demo-project.iam.gserviceaccount.com",
			fixtures.join("service_account.json"),
		)
		.auth_token_file(&cache)
		.token_endpoint(Url::parse(&server.url("/token"))?)
		.build()?;
	let descriptor = ServiceDescriptor::builder("/datastore/v1beta2/datasets/demo")
		.method_path("lookup", "/lookup")
		.scope("https://www.googleapis.com/auth/datastore")
		.build()?;
	// The mock serves a self-signed certificate.
	let transport = ReqwestTransport::from_builder(
		&options,
		Client::builder().danger_accept_invalid_certs(true).danger_accept_invalid_hostnames(true),
	)?;
	let client = RpcClient::with_transport(options, descriptor, transport)?;

	for attempt in 1..=2 {
		let response = client
			.call("lookup", &LookupRequest { keys: vec!["Book:1".into()] }, LookupResponse::default())
			.await?;

		println!("Call {attempt} found {:?}.", response.found);
	}

	token_mock.assert_async().await;
	rpc_mock.assert_calls_async(2).await;

	std::fs::remove_file(&cache)?;

	Ok(())
}
