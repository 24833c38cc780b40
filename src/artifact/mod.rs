//! Contract artifact compiler
//!
//! Compiles the campaign contract with an external `solc` through its standard-JSON interface and
//! writes one `<Contract>.json` file holding `abi` and `bytecode` per compiled contract.

use serde::Serialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Source file compiled by [`compile_contracts`], relative to the contracts directory.
pub const CONTRACT_SOURCE: &str = "Campaign.sol";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Failed to run {0}: {1}")]
	CompilerUnavailable(String, std::io::Error),

	#[error("Compiler exited with {status}: {stderr}")]
	CompilerExited { status: String, stderr: String },

	#[error("Failed to compile solidity:\n{}", .0.join("\n"))]
	CompilationFailed(Vec<String>),

	#[error("Compiler output has no {0}")]
	MissingOutput(String),
}

/// ABI and bytecode of one compiled contract.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractArtifact {
	#[serde(skip)]
	pub name: String,
	pub abi: Value,
	pub bytecode: String,
}

/// Standard-JSON input compiling `source` and selecting its ABI and bytecode.
pub fn standard_json_input(source_name: &str, source: &str) -> Value {
	json!({
		"language": "Solidity",
		"sources": {
			source_name: { "content": source }
		},
		"settings": {
			"outputSelection": {
				"*": { "*": ["abi", "evm.bytecode"] }
			}
		}
	})
}

/// Run `solc --standard-json` on `input` and return its parsed output.
pub async fn run_solc(solc: &str, input: &Value) -> Result<Value, ArtifactError> {
	let mut child = Command::new(solc)
		.arg("--standard-json")
		.stdin(Stdio::piped())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.spawn()
		.map_err(|e| ArtifactError::CompilerUnavailable(solc.to_string(), e))?;

	if let Some(mut stdin) = child.stdin.take() {
		stdin.write_all(&serde_json::to_vec(input)?).await?;
	}

	let output = child.wait_with_output().await?;
	if !output.status.success() {
		return Err(ArtifactError::CompilerExited {
			status: output.status.to_string(),
			stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
		});
	}

	Ok(serde_json::from_slice(&output.stdout)?)
}

/// Extract the artifacts of every contract in `source_name`.
///
/// Fails listing every `formattedMessage` if the output reports an error. Warnings are logged.
pub fn collect_artifacts(
	output: &Value,
	source_name: &str,
) -> Result<Vec<ContractArtifact>, ArtifactError> {
	let mut failures = Vec::new();
	for diagnostic in output["errors"].as_array().into_iter().flatten() {
		let message = diagnostic["formattedMessage"]
			.as_str()
			.or_else(|| diagnostic["message"].as_str())
			.unwrap_or("unknown compiler error")
			.to_string();
		if diagnostic["severity"].as_str() == Some("warning") {
			log::warn!("{}", message);
		} else {
			failures.push(message);
		}
	}
	if !failures.is_empty() {
		for failure in &failures {
			log::error!("{}", failure);
		}
		return Err(ArtifactError::CompilationFailed(failures));
	}

	let contracts = output["contracts"][source_name]
		.as_object()
		.ok_or_else(|| ArtifactError::MissingOutput(format!("contracts for {}", source_name)))?;

	contracts
		.iter()
		.map(|(name, contract)| {
			let bytecode = contract["evm"]["bytecode"]["object"]
				.as_str()
				.ok_or_else(|| ArtifactError::MissingOutput(format!("bytecode for {}", name)))?;
			Ok(ContractArtifact {
				name: name.trim_end_matches(".sol").to_string(),
				abi: contract["abi"].clone(),
				bytecode: bytecode.to_string(),
			})
		})
		.collect()
}

/// Replace `build_dir` with one JSON file per artifact.
pub async fn write_artifacts(
	build_dir: &Path,
	artifacts: &[ContractArtifact],
) -> Result<(), ArtifactError> {
	if tokio::fs::try_exists(build_dir).await? {
		tokio::fs::remove_dir_all(build_dir).await?;
	}
	tokio::fs::create_dir_all(build_dir).await?;

	for artifact in artifacts {
		let file_name = format!("{}.json", artifact.name);
		tokio::fs::write(build_dir.join(&file_name), serde_json::to_vec(artifact)?).await?;
		log::info!("Contract JSON file created: {}", file_name);
	}

	Ok(())
}

/// Compile `contracts_dir/Campaign.sol` and write its artifacts into `build_dir`.
pub async fn compile_contracts(
	contracts_dir: &Path,
	build_dir: &Path,
	solc: &str,
) -> Result<PathBuf, ArtifactError> {
	let source = tokio::fs::read_to_string(contracts_dir.join(CONTRACT_SOURCE)).await?;
	let input = standard_json_input(CONTRACT_SOURCE, &source);

	log::debug!("Compiling {} with {}", CONTRACT_SOURCE, solc);
	let output = run_solc(solc, &input).await?;
	let artifacts = collect_artifacts(&output, CONTRACT_SOURCE)?;
	write_artifacts(build_dir, &artifacts).await?;

	let build_dir = std::path::absolute(build_dir)?;
	log::info!("Build directory created: {}", build_dir.display());
	Ok(build_dir)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn solc_output() -> Value {
		json!({
			"contracts": {
				"Campaign.sol": {
					"Campaign": {
						"abi": [{ "type": "function", "name": "getAllCampaigns" }],
						"evm": { "bytecode": { "object": "6080" } }
					},
					"CampaignFactory": {
						"abi": [],
						"evm": { "bytecode": { "object": "6060" } }
					}
				}
			}
		})
	}

	#[test]
	fn input_selects_abi_and_bytecode() {
		let input = standard_json_input("Campaign.sol", "contract Campaign {}");
		assert_eq!(input["language"], "Solidity");
		assert_eq!(
			input["sources"]["Campaign.sol"]["content"],
			"contract Campaign {}"
		);
		assert_eq!(
			input["settings"]["outputSelection"]["*"]["*"],
			json!(["abi", "evm.bytecode"])
		);
	}

	#[test]
	fn collects_every_contract() {
		let artifacts = collect_artifacts(&solc_output(), "Campaign.sol").unwrap();
		assert_eq!(artifacts.len(), 2);
		let campaign = artifacts.iter().find(|a| a.name == "Campaign").unwrap();
		assert_eq!(campaign.bytecode, "6080");
		assert_eq!(campaign.abi[0]["name"], "getAllCampaigns");
	}

	#[test]
	fn errors_abort_with_every_message() {
		let mut output = solc_output();
		output["errors"] = json!([
			{ "severity": "error", "formattedMessage": "ParserError: expected ';'" },
			{ "severity": "warning", "formattedMessage": "Warning: unused variable" },
			{ "severity": "error", "formattedMessage": "TypeError: bad type" }
		]);

		match collect_artifacts(&output, "Campaign.sol") {
			Err(ArtifactError::CompilationFailed(messages)) => assert_eq!(
				messages,
				vec![
					"ParserError: expected ';'".to_string(),
					"TypeError: bad type".to_string()
				]
			),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn warnings_alone_do_not_abort() {
		let mut output = solc_output();
		output["errors"] = json!([
			{ "severity": "warning", "formattedMessage": "Warning: SPDX license identifier not provided" }
		]);
		assert_eq!(collect_artifacts(&output, "Campaign.sol").unwrap().len(), 2);
	}

	#[tokio::test]
	async fn write_replaces_build_directory() {
		let dir = tempfile::tempdir().unwrap();
		let build_dir = dir.path().join("build");
		std::fs::create_dir_all(&build_dir).unwrap();
		std::fs::write(build_dir.join("Stale.json"), "{}").unwrap();

		let artifacts = collect_artifacts(&solc_output(), "Campaign.sol").unwrap();
		write_artifacts(&build_dir, &artifacts).await.unwrap();

		assert!(!build_dir.join("Stale.json").exists());
		let written: Value =
			serde_json::from_slice(&std::fs::read(build_dir.join("Campaign.json")).unwrap())
				.unwrap();
		assert_eq!(written["bytecode"], "6080");
		assert_eq!(written["abi"][0]["type"], "function");
		assert!(written.get("name").is_none());
		assert!(build_dir.join("CampaignFactory.json").exists());
	}

	#[tokio::test]
	async fn missing_source_is_an_io_error() {
		let dir = tempfile::tempdir().unwrap();
		let result = compile_contracts(dir.path(), &dir.path().join("build"), "solc").await;
		assert!(matches!(result, Err(ArtifactError::Io(_))));
	}
}
