//! Expression evaluation via synthesize-recompile-inject (spec §4.6
//! "Evaluator").
//!
//! There is no way to run arbitrary EVM bytecode against a live contract
//! without actually executing it, so a watch/hover expression is turned
//! into a tiny internal wrapper function, spliced into the owning
//! contract's source (the function body after the contract's opening
//! brace, a reference call to it immediately before the currently-paused
//! line), recompiled, and its runtime bytecode swapped into the live,
//! still-paused VM at the instruction the reference call now occupies.
//! Resuming lets the VM execute the wrapper for real; the return value is
//! recovered the same way any other call's return is observed — a matching
//! jump-out frame pop in the step engine (spec §4.5 step 3).

use std::path::PathBuf;

use alloy_primitives::U256;
use rustc_hash::FxHashMap;

use crate::decoder::{self, DecodedValue, TypeResolver};
use crate::error::EngineError;
use crate::model::{Contract, File};
use crate::program_model::{self, CompilationResult};
use crate::sourcemap::ast::ScopeFrame;

/// Recompiles a source map (file path -> full text) into fresh bytecode
/// and ASTs. Implemented by whatever sits on the other side of the VM
/// adapter connection; the engine only depends on this trait.
pub trait Compiler {
    fn compile(&self, sources: &FxHashMap<PathBuf, String>) -> eyre::Result<CompilationResult>;
}

/// A request to evaluate `expression` at the point execution is currently
/// stopped.
pub struct EvaluationRequest {
    pub expression: String,
    pub file_path: PathBuf,
    pub contract_name: String,
    /// Byte offset of the currently-paused line's start, where the
    /// reference call is spliced in.
    pub insertion_offset: usize,
    /// The scope chain at the paused location, used to resolve free
    /// identifiers in `expression` to in-scope variables (spec §4.6 step
    /// 3, "resolve each to a Variable visible in the frame's scope
    /// chain").
    pub scope_chain: Vec<ScopeFrame>,
}

/// What [`Evaluator::evaluate`] hands back: everything the caller needs to
/// inject the recompiled code and recognize the wrapper's return.
pub struct EvaluationPlan {
    pub recompiled: CompilationResult,
    /// The wrapper's plain (unqualified) name — what the step engine's
    /// call-stack frame carries for an internal jump, since the wrapper is
    /// declared `internal` precisely so the reference call compiles to a
    /// `JUMP` the engine already knows how to track.
    pub wrapper_name: String,
    /// The Solidity type the compiler ultimately accepted as the wrapper's
    /// return type, after any step-6 retry.
    pub expected_type: String,
    /// Program counter (in the recompiled runtime code) of the spliced
    /// reference call — where the VM should resume (spec §4.6 step 8-10).
    pub resume_pc: usize,
    /// Line, in the mutated source, immediately after the inserted
    /// reference call; the caller installs an invisible breakpoint there
    /// as a safety net (spec §4.6 step 9).
    pub post_call_line: usize,
    /// Original-source line the wrapper function body was inserted after,
    /// and how many lines that insertion added — the caller threads both
    /// through [`File::record_insertion`] to keep breakpoints coherent.
    pub brace_line: usize,
    pub function_lines: i64,
    /// Original-source line the reference call was inserted before, and
    /// how many lines that insertion added.
    pub call_line: usize,
    pub call_lines: i64,
}

/// Walks `expression` for identifier tokens (Solidity-lexeme rules: starts
/// with `[A-Za-z_]`, continues with `[A-Za-z0-9_]`), in first-seen order,
/// deduplicated. Good enough for resolving simple variable references;
/// doesn't need to understand precedence or member access.
fn extract_identifiers(expression: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = expression.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c.is_ascii_alphabetic() || c == '_' {
            let mut end = start + c.len_utf8();
            while let Some(&(_, next)) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    end += next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let token = &expression[start..end];
            if !is_reserved(token) && !out.iter().any(|t: &String| t == token) {
                out.push(token.to_string());
            }
        }
    }
    out
}

fn is_reserved(token: &str) -> bool {
    matches!(
        token,
        "true" | "false" | "msg" | "sender" | "value" | "tx" | "origin" | "block" | "timestamp" | "number" | "this"
    )
}

/// Resolves every identifier in `expression` to an in-scope variable's
/// declared type, innermost scope first (spec §4.6 step 3). Identifiers
/// that don't resolve to anything (builtins, member-access roots) are left
/// out of the wrapper's parameter list and referenced as-is in its body.
fn resolve_params(expression: &str, scope_chain: &[ScopeFrame], contract: &Contract) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for ident in extract_identifiers(expression) {
        let found = scope_chain.iter().find_map(|frame| {
            contract
                .scope_variables
                .get(&frame.ast_id)
                .and_then(|vars| vars.iter().find(|v| v.name == ident))
        });
        if let Some(var) = found {
            params.push((ident, var.type_string.clone()));
        }
    }
    params
}

struct Wrapper {
    name: String,
    params: Vec<(String, String)>,
    return_type: String,
    expression: String,
}

impl Wrapper {
    fn function_source(&self) -> String {
        let args = self.params.iter().map(|(name, ty)| format!("{ty} {name}")).collect::<Vec<_>>().join(", ");
        format!(
            "    function {}({args}) internal returns ({}) {{\n        return {};\n    }}\n",
            self.name, self.return_type, self.expression
        )
    }

    fn reference_call(&self) -> String {
        let args = self.params.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>().join(", ");
        format!("{}({args});\n", self.name)
    }
}

/// Splices `wrapper`'s function body right after `brace_offset` (the byte
/// just past the owning contract's opening `{`) and a reference call right
/// before `call_offset`, returning the new text plus how many lines each
/// splice inserted (spec §4.6 step 5).
fn splice(text: &str, brace_offset: usize, call_offset: usize, wrapper: &Wrapper) -> (String, i64, i64) {
    let function_source = wrapper.function_source();
    let reference_call = wrapper.reference_call();
    let function_lines = function_source.matches('\n').count() as i64;
    let call_lines = reference_call.matches('\n').count() as i64;

    let mut out = String::with_capacity(text.len() + function_source.len() + reference_call.len());
    out.push_str(&text[..brace_offset]);
    out.push('\n');
    out.push_str(&function_source);
    out.push_str(&text[brace_offset..call_offset]);
    out.push_str(&reference_call);
    out.push_str(&text[call_offset..]);
    (out, function_lines + 1, call_lines)
}

/// Byte offset just past `contract <name>`'s opening brace, found by plain
/// text search (the AST's own node range would work too, but the brace
/// itself isn't a separate AST node).
fn contract_brace_offset(text: &str, contract_name: &str) -> eyre::Result<usize> {
    let needle = format!("contract {contract_name}");
    let decl_at = text
        .find(&needle)
        .ok_or_else(|| EngineError::Evaluator(format!("contract `{contract_name}` not found in its own source")))?;
    let brace_at = text[decl_at..]
        .find('{')
        .ok_or_else(|| EngineError::Evaluator(format!("no opening brace found for contract `{contract_name}`")))?;
    Ok(decl_at + brace_at + 1)
}

/// Parses the compiler's "return type isn't convertible" diagnostic for
/// the actual expression type, per spec §4.6 step 6: `Return argument
/// type (.*) is not implicitly convertible...`.
fn parse_return_type_from_error(message: &str) -> Option<String> {
    let start = message.find("Return argument type ")? + "Return argument type ".len();
    let rest = &message[start..];
    let end = rest.find(" is not implicitly convertible")?;
    Some(rest[..end].trim().to_string())
}

/// Drives one synthesize-recompile-inject cycle.
pub struct Evaluator<'a> {
    compiler: &'a dyn Compiler,
    nonce: u32,
}

impl<'a> Evaluator<'a> {
    /// `nonce` must be unique for the lifetime of the owning session (spec
    /// §4.6 step 4, "synthesize a wrapper"): every `evaluate()` call commits
    /// its spliced wrapper into the file permanently, so reusing a name
    /// across calls would splice a second definition with the same
    /// identifier and the recompile would fail as a duplicate.
    pub fn new(compiler: &'a dyn Compiler, nonce: u32) -> Self {
        Self { compiler, nonce }
    }

    /// Synthesizes, splices, and recompiles `request` against `contract`'s
    /// owning `file`, retrying once with a corrected return type if the
    /// compiler rejects the initial `bool` guess (spec §4.6 steps 4-8).
    pub fn evaluate(&mut self, request: &EvaluationRequest, file: &File, contract: &Contract) -> eyre::Result<EvaluationPlan> {
        if request.expression.trim().is_empty() {
            return Err(EngineError::Evaluator("empty expression".into()).into());
        }

        let name = format!("__sdb_eval_{}", self.nonce);
        let params = resolve_params(&request.expression, &request.scope_chain, contract);

        let mut wrapper = Wrapper { name, params, return_type: "bool".to_string(), expression: request.expression.clone() };
        let brace_offset = contract_brace_offset(&file.source, &contract.name)?;

        let (recompiled, final_wrapper) = match self.try_compile(&request.file_path, &file.source, brace_offset, request.insertion_offset, &wrapper) {
            Ok(result) => (result, wrapper),
            Err(first_err) => {
                let Some(actual_type) = parse_return_type_from_error(&first_err.to_string()) else {
                    return Err(EngineError::Evaluator(format!("evaluation compile error: {first_err}")).into());
                };
                wrapper.return_type = actual_type;
                let result = self
                    .try_compile(&request.file_path, &file.source, brace_offset, request.insertion_offset, &wrapper)
                    .map_err(|e| EngineError::Evaluator(format!("evaluation compile error after return-type fix: {e}")))?;
                (result, wrapper)
            }
        };

        let recompiled_unit = &recompiled
            .sources
            .iter()
            .find(|s| s.path == request.file_path)
            .ok_or_else(|| EngineError::Evaluator("recompiled output missing the evaluated file".into()))?
            .ast;
        let resolver = program_model::struct_resolver(recompiled_unit);
        let _ = decoder::parse_type(&final_wrapper.return_type, &resolver)?; // validates the type is decodable

        let recompiled_contract = recompiled
            .contracts
            .iter()
            .find(|c| c.name == contract.name)
            .ok_or_else(|| EngineError::Evaluator("recompiled output missing the evaluated contract".into()))?;
        let call_ic = crate::sourcemap::ast::locate(
            recompiled_unit,
            crate::sourcemap::ast::NodeKind::FunctionCall,
            request.insertion_offset,
            1,
        )?
        .and_then(|m| {
            let locations = crate::sourcemap::decode_source_map(&recompiled_contract.runtime_source_map).ok()?;
            locations.iter().position(|loc| loc.start >= m.start && loc.start < m.start + m.length.max(1))
        })
        .ok_or_else(|| EngineError::Evaluator("could not locate the spliced reference call in the recompiled bytecode".into()))?;

        let ic_to_pc = crate::model::contract::IcPcMap::new(&recompiled_contract.runtime_code);
        let resume_pc = ic_to_pc
            .get(call_ic)
            .ok_or_else(|| EngineError::Evaluator("reference call's instruction index has no program counter".into()))?;

        let function_lines = 1 + final_wrapper.function_source().matches('\n').count() as i64;
        let call_lines = final_wrapper.reference_call().matches('\n').count() as i64;

        Ok(EvaluationPlan {
            recompiled,
            wrapper_name: final_wrapper.name.clone(),
            expected_type: final_wrapper.return_type.clone(),
            resume_pc,
            post_call_line: file.line_of_offset(request.insertion_offset) + 1,
            brace_line: file.line_of_offset(brace_offset),
            function_lines,
            call_line: file.line_of_offset(request.insertion_offset),
            call_lines,
        })
    }

    fn try_compile(
        &self,
        path: &PathBuf,
        text: &str,
        brace_offset: usize,
        call_offset: usize,
        wrapper: &Wrapper,
    ) -> eyre::Result<CompilationResult> {
        let (spliced, _, _) = splice(text, brace_offset, call_offset, wrapper);
        let mut sources = FxHashMap::default();
        sources.insert(path.clone(), spliced);
        self.compiler.compile(&sources)
    }
}

/// Decodes a single return word captured off the VM's stack when the
/// wrapper's frame popped (spec §4.6 "return-value recovery").
pub fn decode_return_value(word: U256, expected_type: &str, resolver: &dyn TypeResolver) -> eyre::Result<DecodedValue> {
    let detail = decoder::parse_type(expected_type, resolver)?;
    let crate::model::Detail::Value(v) = detail else {
        return Err(EngineError::Evaluator(format!("unsupported evaluator return type: {expected_type}")).into());
    };
    let bytes = word.to_be_bytes::<32>();
    let tail = &bytes[32 - v.width as usize..];
    Ok(match v.kind {
        crate::model::detail::ValueKind::Boolean => DecodedValue::Bool(tail.last().copied().unwrap_or(0) != 0),
        crate::model::detail::ValueKind::Unsigned => DecodedValue::Unsigned(U256::from_be_slice(tail)),
        crate::model::detail::ValueKind::Signed => DecodedValue::Signed(alloy_primitives::I256::from_be_bytes(bytes)),
        crate::model::detail::ValueKind::Address => {
            let mut buf = [0u8; 20];
            buf.copy_from_slice(&tail[tail.len() - 20..]);
            DecodedValue::Address(alloy_primitives::Address::from(buf))
        }
        crate::model::detail::ValueKind::FixedBytes => DecodedValue::Bytes(bytes[..v.width as usize].to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_unique_identifiers_in_order() {
        let ids = extract_identifiers("x * 2 + x - y");
        assert_eq!(ids, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn reserved_words_are_excluded() {
        let ids = extract_identifiers("msg.sender == owner");
        assert_eq!(ids, vec!["owner".to_string()]);
    }

    #[test]
    fn parses_return_type_from_solc_message() {
        let msg = "Return argument type uint256 is not implicitly convertible to expected type (type of first return variable) bool.";
        assert_eq!(parse_return_type_from_error(msg), Some("uint256".to_string()));
    }

    #[test]
    fn wrapper_source_has_expected_shape() {
        let wrapper = Wrapper {
            name: "__sdb_eval_1".into(),
            params: vec![("x".into(), "uint256".into())],
            return_type: "uint256".into(),
            expression: "x * 2".into(),
        };
        assert!(wrapper.function_source().contains("function __sdb_eval_1(uint256 x) internal returns (uint256)"));
        assert_eq!(wrapper.reference_call(), "__sdb_eval_1(x);\n");
    }

    #[test]
    fn splice_inserts_function_before_call() {
        let text = "contract C {\n    function f() public {\n        uint x = 1;\n    }\n}\n";
        let wrapper = Wrapper { name: "w".into(), params: vec![], return_type: "bool".into(), expression: "true".into() };
        let brace = contract_brace_offset(text, "C").unwrap();
        let call_at = text.find("uint x").unwrap();
        let (spliced, _, _) = splice(text, brace, call_at, &wrapper);
        assert!(spliced.find("function w()").unwrap() < spliced.find("uint x").unwrap());
        assert!(spliced.contains("w();\n"));
    }
}
