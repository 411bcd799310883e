//! A [`Compiler`] implementation over `foundry-compilers`' solc bindings
//! (spec §4.6 "the evaluator needs a Compiler trait... a production host
//! would implement it over foundry-compilers"). The engine itself only
//! depends on the trait; this is the one concrete implementation the CLI
//! wires in.

use std::{collections::BTreeMap, path::PathBuf};

use alloy_primitives::Bytes;
use foundry_compilers::{
    artifacts::{output_selection::OutputSelection, Settings, Source, SolcInput},
    solc::{Solc, SolcLanguage},
};
use rustc_hash::FxHashMap;
use sdb_engine::evaluator::Compiler;
use sdb_engine::program_model::{CompilationResult, ContractArtifact, SourceInput};

pub struct SolcCompiler {
    version: semver::Version,
}

impl SolcCompiler {
    pub fn new(version: semver::Version) -> Self {
        Self { version }
    }
}

impl Compiler for SolcCompiler {
    fn compile(&self, sources: &FxHashMap<PathBuf, String>) -> eyre::Result<CompilationResult> {
        let solc_sources: BTreeMap<PathBuf, Source> =
            sources.iter().map(|(path, text)| (path.clone(), Source::new(text.clone()))).collect();

        let mut settings = Settings::default();
        settings.output_selection = OutputSelection::complete_output_selection();
        let input = SolcInput::new(SolcLanguage::Solidity, solc_sources, settings);

        let solc = Solc::find_or_install(&self.version)?;
        let output = solc.compile_exact(&input)?;

        let error_messages: Vec<String> = output
            .errors
            .iter()
            .filter(|e| e.severity.is_error())
            .map(|e| e.formatted_message.clone().unwrap_or_else(|| e.message.clone()))
            .collect();
        if !error_messages.is_empty() {
            eyre::bail!(error_messages.join("\n"));
        }

        let mut out_sources = Vec::new();
        for (path, source_file) in &output.sources {
            let Some(ast) = &source_file.ast else { continue };
            let ast_value = serde_json::to_value(ast)?;
            let unit: foundry_compilers::artifacts::SourceUnit = serde_json::from_value(ast_value)?;
            let path = PathBuf::from(path);
            let text = sources.get(&path).cloned().unwrap_or_default();
            out_sources.push(SourceInput { path, text, ast: unit });
        }

        let mut out_contracts = Vec::new();
        for (path, file_contracts) in &output.contracts {
            for (name, contract) in file_contracts {
                let Some(evm) = &contract.evm else { continue };
                let Some(deployed) = evm.deployed_bytecode.as_ref().and_then(|d| d.bytecode.as_ref()) else { continue };
                let Some(runtime_code) = deployed.object.as_bytes() else { continue };
                let creation_code = evm.bytecode.as_ref().and_then(|b| b.object.as_bytes()).cloned().unwrap_or_default();
                out_contracts.push(ContractArtifact {
                    name: name.clone(),
                    source_path: PathBuf::from(path),
                    creation_code: Bytes::from(creation_code.to_vec()),
                    runtime_code: Bytes::from(runtime_code.to_vec()),
                    runtime_source_map: deployed.source_map.clone().unwrap_or_default(),
                });
            }
        }

        Ok(CompilationResult { sources: out_sources, contracts: out_contracts })
    }
}
