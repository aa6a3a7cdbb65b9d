//! Fetching of dataset resources and manual coordinate export/import.

use std::collections::BTreeMap;

use gloo_net::http::Request;
use thiserror::Error;
use wasm_bindgen::JsCast;
use web_sys::HtmlAnchorElement;

use super::topology::{MapShapes, Topology};
use super::types::{DocumentError, GraphDocument};

/// Why a resource load failed, surfaced to the user instead of silently
/// defaulting.
#[derive(Debug, Error)]
pub enum LoadError {
	#[error("network error fetching {url}: {message}")]
	Network { url: String, message: String },
	#[error("HTTP {status} fetching {url}")]
	Http { status: u16, url: String },
	#[error("{url}: {source}")]
	Document {
		url: String,
		#[source]
		source: DocumentError,
	},
	#[error("{url} has no `{object}` object")]
	MissingObject { url: String, object: &'static str },
}

async fn fetch_text(url: &str) -> Result<String, LoadError> {
	let response = Request::get(url)
		.send()
		.await
		.map_err(|e| LoadError::Network {
			url: url.to_string(),
			message: e.to_string(),
		})?;
	if !response.ok() {
		return Err(LoadError::Http {
			status: response.status(),
			url: url.to_string(),
		});
	}
	response.text().await.map_err(|e| LoadError::Network {
		url: url.to_string(),
		message: e.to_string(),
	})
}

/// Fetch and validate a graph-data document.
pub async fn load_graph(url: &str) -> Result<GraphDocument, LoadError> {
	let body = fetch_text(url).await?;
	GraphDocument::from_json(&body).map_err(|source| LoadError::Document {
		url: url.to_string(),
		source,
	})
}

/// Fetch the background topology and decode its states object.
pub async fn load_map_shapes(url: &str) -> Result<MapShapes, LoadError> {
	let body = fetch_text(url).await?;
	let topo: Topology = serde_json::from_str(&body).map_err(|e| LoadError::Document {
		url: url.to_string(),
		source: DocumentError::Parse(e),
	})?;
	MapShapes::from_topology(&topo, "states").ok_or(LoadError::MissingObject {
		url: url.to_string(),
		object: "states",
	})
}

/// Fetch a previously saved short-name-to-coordinates mapping.
pub async fn load_positions(url: &str) -> Result<BTreeMap<String, [f64; 2]>, LoadError> {
	let body = fetch_text(url).await?;
	serde_json::from_str(&body).map_err(|e| LoadError::Document {
		url: url.to_string(),
		source: DocumentError::Parse(e),
	})
}

/// Trigger a client-side download of a coordinate mapping as JSON, via a
/// temporary anchor element with a data URI.
pub fn download_positions(positions: &BTreeMap<String, [f64; 2]>, file_name: &str) {
	let Ok(json) = serde_json::to_string(positions) else {
		return;
	};
	let Some(document) = web_sys::window().and_then(|w| w.document()) else {
		return;
	};
	let Ok(element) = document.create_element("a") else {
		return;
	};
	let anchor: HtmlAnchorElement = element.unchecked_into();
	let encoded = String::from(js_sys::encode_uri_component(&json));
	anchor.set_href(&format!("data:text/json;charset=utf-8,{encoded}"));
	anchor.set_download(file_name);
	if let Some(body) = document.body() {
		let _ = body.append_child(&anchor);
		anchor.click();
		anchor.remove();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn errors_name_the_resource() {
		let err = LoadError::Http {
			status: 404,
			url: "data/graph_E_CO2i.json".to_string(),
		};
		assert_eq!(err.to_string(), "HTTP 404 fetching data/graph_E_CO2i.json");
	}

	#[test]
	fn saved_positions_round_trip_as_json() {
		let mut positions = BTreeMap::new();
		positions.insert("CISO".to_string(), [-119.4, 36.8]);
		positions.insert("MISO".to_string(), [-93.3, 44.0]);
		let json = serde_json::to_string(&positions).expect("serializes");
		let back: BTreeMap<String, [f64; 2]> = serde_json::from_str(&json).expect("parses");
		assert_eq!(positions, back);
	}
}
