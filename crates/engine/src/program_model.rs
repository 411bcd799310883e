//! Building [`Contract`]s and [`File`]s out of compiler output (spec §4.3
//! "Program model construction").

use std::path::PathBuf;

use alloy_primitives::{keccak256, Address, Bytes};
use foundry_compilers::artifacts::{ContractDefinition, FunctionDefinition, SourceUnit, VariableDeclaration};
use rustc_hash::FxHashMap;
use revm::interpreter::opcode;

use crate::decoder::{self, TypeResolver};
use crate::model::{Contract, File, ScopeRef, Variable};
use crate::sourcemap::ast;
use crate::sourcemap::visitor::{Visitor, Walk};

/// One compiled source file: its text and parsed AST.
///
/// `serde`-derived so the CLI can deserialize a `linkCompilerOutput` trigger
/// straight into this shape (spec §6 "VM adapter channel").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SourceInput {
    pub path: PathBuf,
    pub text: String,
    pub ast: SourceUnit,
}

/// One compiled contract's artifact, exactly the fields the engine needs
/// (spec §3 "Contract" — deliberately narrower than a full
/// `foundry_compilers` `ConfigurableContractArtifact`, since the engine
/// only cares about bytecode, its source map, and which source it came
/// from).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ContractArtifact {
    pub name: String,
    pub source_path: PathBuf,
    pub creation_code: Bytes,
    pub runtime_code: Bytes,
    pub runtime_source_map: String,
}

/// The input to [`link_compiler_output`]: every compiled file and contract
/// in one compilation run.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CompilationResult {
    pub sources: Vec<SourceInput>,
    pub contracts: Vec<ContractArtifact>,
}

/// A [`TypeResolver`] backed by one compiled source's AST, for callers
/// outside this module (the evaluator resolves the recompiled unit's
/// structs the same way contract linking does).
pub fn struct_resolver(unit: &SourceUnit) -> impl TypeResolver + '_ {
    AstStructResolver { unit }
}

struct AstStructResolver<'a> {
    unit: &'a SourceUnit,
}

impl TypeResolver for AstStructResolver<'_> {
    fn resolve_struct(&self, name: &str) -> Option<Vec<(String, String)>> {
        let short_name = name.rsplit('.').next().unwrap_or(name);
        let mut collector = StructCollector { name: short_name.to_string(), found: None };
        let _ = self.unit.walk(&mut collector);
        collector.found
    }
}

struct StructCollector {
    name: String,
    found: Option<Vec<(String, String)>>,
}

impl Visitor for StructCollector {
    fn visit_struct_definition(&mut self, node: &foundry_compilers::artifacts::StructDefinition) -> eyre::Result<()> {
        if node.name == self.name {
            self.found = Some(
                node.members
                    .iter()
                    .map(|m| (m.name.clone(), m.type_descriptions.type_string.clone().unwrap_or_default()))
                    .collect(),
            );
        }
        Ok(())
    }
}

/// Gathers every top-level `VariableDeclaration` in a scope, used to seed
/// `Contract::scope_variables` (spec §4.3 "Populate scopeVariables").
struct VariableCollector<'a> {
    resolver: &'a dyn TypeResolver,
    out: FxHashMap<usize, Vec<Variable>>,
    unit: &'a SourceUnit,
}

impl Visitor for VariableCollector<'_> {
    fn visit_variable_declaration(&mut self, node: &VariableDeclaration) -> eyre::Result<()> {
        let start = node.src.start.unwrap_or_default();
        let chain = ast::scope_chain(self.unit, start)?;
        let Some(frame) = chain.first() else { return Ok(()) };
        let type_string = node
            .type_descriptions
            .type_string
            .clone()
            .unwrap_or_else(|| "uint256".to_string());
        let location = if node.state_variable {
            crate::model::Location::Storage
        } else {
            match node.storage_location {
                foundry_compilers::artifacts::StorageLocation::Memory => crate::model::Location::Memory,
                foundry_compilers::artifacts::StorageLocation::Storage => crate::model::Location::Storage,
                foundry_compilers::artifacts::StorageLocation::Calldata => crate::model::Location::CallData,
                _ => crate::model::Location::Stack,
            }
        };
        let detail = match decoder::parse_type(&type_string, self.resolver) {
            Ok(d) => d,
            Err(_) => return Ok(()),
        };
        let scope = ScopeRef { ast_id: frame.ast_id, child_index: frame.child_index, depth: frame.depth };
        let variable = Variable::new(node.name.clone(), type_string, scope, location, detail);
        self.out.entry(frame.ast_id).or_default().push(variable);
        Ok(())
    }
}

struct FunctionSignatureCollector {
    contract_name: String,
    signatures: Vec<(String, [u8; 4])>,
}

impl Visitor for FunctionSignatureCollector {
    fn visit_contract_definition(&mut self, node: &ContractDefinition) -> eyre::Result<()> {
        if node.name != self.contract_name {
            return Ok(());
        }
        for part in &node.nodes {
            if let foundry_compilers::artifacts::ContractDefinitionPart::FunctionDefinition(f) = part {
                if let Some((sig, selector)) = function_selector(f) {
                    self.signatures.push((sig, selector));
                }
            }
        }
        Ok(())
    }
}

/// Best-effort ABI canonicalization: exact for primitives and arrays of
/// primitives, falls back to the solc type string for structs/tuples
/// (tracked as an open gap in `DESIGN.md`).
fn canonical_type(type_string: &str) -> String {
    let t = type_string.split(' ').next().unwrap_or(type_string);
    if let Some(rest) = t.strip_prefix("uint") {
        return format!("uint{}", if rest.is_empty() { "256" } else { rest });
    }
    if let Some(rest) = t.strip_prefix("int") {
        return format!("int{}", if rest.is_empty() { "256" } else { rest });
    }
    t.to_string()
}

fn function_selector(f: &FunctionDefinition) -> Option<(String, [u8; 4])> {
    let is_external_or_public = matches!(
        f.visibility,
        foundry_compilers::artifacts::Visibility::External | foundry_compilers::artifacts::Visibility::Public
    );
    let is_function = matches!(f.kind, foundry_compilers::artifacts::FunctionDefinitionKind::Function);
    if !is_external_or_public || !is_function {
        return None;
    }
    let params: Vec<String> = f
        .parameters
        .parameters
        .iter()
        .map(|p| canonical_type(p.type_descriptions.type_string.as_deref().unwrap_or("uint256")))
        .collect();
    let signature = format!("{}({})", f.name, params.join(","));
    let hash = keccak256(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&hash[..4]);
    Some((signature, selector))
}

/// Scans `runtime_code` for the standard dispatcher pattern — a `PUSH4`
/// loading a known selector, followed shortly by a `PUSHn`/`JUMPI` pair —
/// and records the jump target as that function's entry pc (spec §4.3
/// "Build functionEntryMap").
fn build_function_entry_map(runtime_code: &[u8], signatures: &[(String, [u8; 4])]) -> FxHashMap<usize, String> {
    let by_selector: FxHashMap<[u8; 4], &str> =
        signatures.iter().map(|(sig, sel)| (*sel, sig.as_str())).collect();
    let mut map = FxHashMap::default();
    let mut pc = 0usize;
    while pc < runtime_code.len() {
        let op = runtime_code[pc];
        if op == opcode::PUSH4 && pc + 5 <= runtime_code.len() {
            let mut sel = [0u8; 4];
            sel.copy_from_slice(&runtime_code[pc + 1..pc + 5]);
            if let Some(name) = by_selector.get(&sel) {
                if let Some(target) = scan_for_jumpi_target(runtime_code, pc + 5, 32) {
                    map.insert(target, name.to_string());
                }
            }
        }
        if (opcode::PUSH1..=opcode::PUSH32).contains(&op) {
            pc += (op - opcode::PUSH1 + 1) as usize;
        }
        pc += 1;
    }
    map
}

fn scan_for_jumpi_target(code: &[u8], start: usize, window: usize) -> Option<usize> {
    let end = (start + window).min(code.len());
    let mut i = start;
    let mut last_push = None;
    while i < end {
        let op = code[i];
        if (opcode::PUSH1..=opcode::PUSH32).contains(&op) {
            let width = (op - opcode::PUSH1 + 1) as usize;
            if i + 1 + width <= code.len() {
                let mut value = 0usize;
                for byte in &code[i + 1..i + 1 + width] {
                    value = (value << 8) | (*byte as usize);
                }
                last_push = Some(value);
            }
            i += width;
        } else if op == opcode::JUMPI {
            return last_push;
        }
        i += 1;
    }
    None
}

/// Builds the engine's [`File`] and [`Contract`] maps from one compilation
/// run (spec §4.3 "linkCompilerOutput").
pub fn link_compiler_output(result: CompilationResult) -> eyre::Result<(FxHashMap<PathBuf, File>, FxHashMap<String, Contract>)> {
    let mut files = FxHashMap::default();
    let mut asts: FxHashMap<PathBuf, &SourceUnit> = FxHashMap::default();
    for source in &result.sources {
        files.insert(source.path.clone(), File::new(source.path.clone(), source.text.clone()));
        asts.insert(source.path.clone(), &source.ast);
    }

    let mut contracts = FxHashMap::default();
    for artifact in result.contracts {
        let mut contract = Contract::new(
            artifact.name.clone(),
            artifact.source_path.clone(),
            artifact.creation_code,
            artifact.runtime_code,
            artifact.runtime_source_map,
        )?;

        if let Some(unit) = asts.get(&artifact.source_path) {
            let resolver = AstStructResolver { unit };
            let mut sig_collector = FunctionSignatureCollector { contract_name: artifact.name.clone(), signatures: Vec::new() };
            unit.walk(&mut sig_collector)?;
            contract.function_entry_map = build_function_entry_map(&contract.runtime_code, &sig_collector.signatures);

            let mut var_collector = VariableCollector { resolver: &resolver, out: FxHashMap::default(), unit };
            unit.walk(&mut var_collector)?;
            contract.scope_variables = var_collector.out;
            contract.ast_root_id = find_contract_ast_id(unit, &artifact.name);

            // State variables share one running storage cursor across the
            // whole contract, in declaration order, per solc's packing
            // rule (spec §4.2 "Storage packing").
            if let Some(root_id) = contract.ast_root_id {
                if let Some(state_vars) = contract.scope_variables.get_mut(&root_id) {
                    let mut cursor = decoder::StorageCursor::default();
                    let mut memory_base = 0u64;
                    for variable in state_vars.iter_mut() {
                        decoder::apply_positions(&mut variable.detail, variable.location, &mut cursor, &mut memory_base)?;
                        if let Some(pos) = variable.detail.position_u64() {
                            variable.position = Some(pos);
                        }
                    }
                }
            }

            if let Some(file) = files.get_mut(&artifact.source_path) {
                file.contracts.push(artifact.name.clone());
            }
        }

        contracts.insert(artifact.name.clone(), contract);
    }

    Ok((files, contracts))
}

fn find_contract_ast_id(unit: &SourceUnit, name: &str) -> Option<usize> {
    struct Finder<'a> {
        name: &'a str,
        id: Option<usize>,
    }
    impl Visitor for Finder<'_> {
        fn visit_contract_definition(&mut self, node: &ContractDefinition) -> eyre::Result<()> {
            if node.name == self.name {
                self.id = Some(node.id);
            }
            Ok(())
        }
    }
    let mut finder = Finder { name, id: None };
    let _ = unit.walk(&mut finder);
    finder.id
}

/// Binds a `Contract` to its on-chain address once the VM adapter reports a
/// `CREATE`/`CREATE2` (spec §4.3 "linkContractAddress" / "newContract").
/// Bytecode-similarity matching is intentionally simple: an exact match on
/// `runtime_code`, since the engine never sees partially-verified sources.
pub fn link_contract_address<'a>(
    contracts: &'a mut FxHashMap<String, Contract>,
    deployed_runtime_code: &[u8],
    address: Address,
) -> Option<&'a mut Contract> {
    let name = contracts
        .iter()
        .find(|(_, c)| c.runtime_code.as_ref() == deployed_runtime_code)
        .map(|(name, _)| name.clone())?;
    let contract = contracts.get_mut(&name)?;
    contract.address = Some(address);
    Some(contract)
}

/// Binds a `Contract` to its on-chain address by name (spec §4.3
/// "linkContractAddress" when the trigger already names the contract,
/// rather than `newContract`'s deduce-from-bytecode path).
pub fn link_contract_address_by_name<'a>(
    contracts: &'a mut FxHashMap<String, Contract>,
    name: &str,
    address: Address,
) -> Option<&'a mut Contract> {
    let contract = contracts.get_mut(name)?;
    contract.address = Some(address);
    Some(contract)
}
