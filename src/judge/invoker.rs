//! Invocation of the resolved entry point.
//!
//! The call happens in a separate launcher process generated for the resolved
//! shape and linked against the submission rlib. The launcher materialises the
//! argument, calls the entry point once, and writes the argument state back.
//! It runs under the invocation deadline and is killed when that expires.

use crate::config::presets::RustToolchain;
use crate::config::types::{Result, SortboxError};
use crate::exec::deadline::Deadline;
use crate::exec::process::{run_supervised, ProcessOutput};
use crate::judge::compiler::check_toolchain_output;
use crate::judge::loader::LoadedArtifact;
use crate::judge::marshal::ResultMarshaler;
use crate::judge::resolver::{CandidateEntryPoint, ParamShape};
use crate::safety::workspace::Workspace;
use crate::utils::output::OutputLimits;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::path::PathBuf;

pub const LAUNCHER_SOURCE: &str = "launcher.rs";
pub const LAUNCHER_BIN: &str = "launcher";
pub const INPUT_FILE: &str = "input.txt";
pub const RESULT_FILE: &str = "result.txt";

const BACKTRACE_HINT: &str = "note: run with `RUST_BACKTRACE=1`";

pub struct Invoker<'a> {
    toolchain: &'a RustToolchain,
    limits: &'a OutputLimits,
}

impl<'a> Invoker<'a> {
    pub fn new(toolchain: &'a RustToolchain, limits: &'a OutputLimits) -> Self {
        Self { toolchain, limits }
    }

    /// Run `entry` from `unit` on a copy of `input` and return the argument afterwards.
    pub fn invoke(
        &self,
        unit: &LoadedArtifact<'_>,
        entry: &CandidateEntryPoint,
        input: &[i32],
        workspace: &mut Workspace,
        deadline: &Deadline,
    ) -> Result<Vec<i32>> {
        let launcher = self.build_launcher(unit, entry, workspace, deadline)?;
        let input_path =
            workspace.write_file(INPUT_FILE, ResultMarshaler::encode(input).as_bytes())?;
        let result_path = workspace.path(RESULT_FILE);

        let argv = vec![
            launcher.to_string_lossy().to_string(),
            input_path.to_string_lossy().to_string(),
            result_path.to_string_lossy().to_string(),
        ];
        let output = run_supervised(
            &argv,
            workspace.run_dir(),
            &[("RUST_BACKTRACE", "0")],
            deadline,
            self.limits,
        )?;

        if output.timed_out {
            log::info!("{} killed at the deadline", entry);
            return Err(deadline.timeout_error());
        }
        if !output.success() {
            return Err(SortboxError::Invocation(describe_fault(&output)));
        }

        let result = ResultMarshaler::read(&result_path)?;
        // The call may have returned just past the ceiling.
        deadline.check()?;
        Ok(result)
    }

    fn build_launcher(
        &self,
        unit: &LoadedArtifact<'_>,
        entry: &CandidateEntryPoint,
        workspace: &mut Workspace,
        deadline: &Deadline,
    ) -> Result<PathBuf> {
        let source = launcher_source(unit.crate_name(), entry);
        let source_path = workspace.write_file(LAUNCHER_SOURCE, source.as_bytes())?;
        let binary_path = workspace.path(LAUNCHER_BIN);

        let artifact = unit.artifact();
        let argv = self.toolchain.launcher_command(
            &artifact.crate_name,
            &artifact.rlib_path,
            &source_path,
            &binary_path,
            &artifact.search_dir,
        );
        let output = run_supervised(&argv, workspace.run_dir(), &[], deadline, self.limits)?;

        match check_toolchain_output(&output, deadline, &self.toolchain.rustc) {
            Ok(()) => Ok(binary_path),
            // The declared signature matched structurally but did not link,
            // e.g. a user-defined type shadowing `Vec`.
            Err(SortboxError::Compile { diagnostics }) => Err(SortboxError::Resolution(format!(
                "entry point {} does not accept the standard argument types:\n{}",
                entry, diagnostics
            ))),
            Err(other) => Err(other),
        }
    }
}

/// Source of the launcher crate for `entry` in `crate_name`.
pub fn launcher_source(crate_name: &str, entry: &CandidateEntryPoint) -> String {
    let krate = format_ident!("{}", crate_name);
    let func = format_ident!("{}", entry.name);

    let bind = match entry.shape {
        ParamShape::Slice | ParamShape::Vec => quote! { let mut arg: Vec<i32> = input; },
        ParamShape::BoxedSlice => quote! { let mut arg: Box<[i32]> = input.into_boxed_slice(); },
    };
    let borrow = match entry.shape {
        ParamShape::Slice => quote! { &mut arg[..] },
        ParamShape::BoxedSlice | ParamShape::Vec => quote! { &mut arg },
    };
    let call: TokenStream = match entry.bounds {
        None => quote! { #krate::#func(#borrow); },
        Some((low, high)) => {
            let low_ty = format_ident!("{}", low.as_str());
            let high_ty = format_ident!("{}", high.as_str());
            if high.is_unsigned() {
                // len - 1 does not exist for an empty input
                quote! {
                    if !arg.is_empty() {
                        let high = (arg.len() - 1) as #high_ty;
                        #krate::#func(#borrow, 0 as #low_ty, high);
                    }
                }
            } else {
                quote! {
                    let high = (arg.len() as #high_ty) - 1;
                    #krate::#func(#borrow, 0 as #low_ty, high);
                }
            }
        }
    };

    let launcher = quote! {
        fn main() {
            let mut args = std::env::args_os().skip(1);
            let input_path = args.next().expect("launcher: missing input path");
            let result_path = args.next().expect("launcher: missing result path");
            let raw = std::fs::read_to_string(&input_path).expect("launcher: unreadable input");
            let input: Vec<i32> = raw
                .split_whitespace()
                .map(|token| token.parse::<i32>().expect("launcher: malformed input"))
                .collect();

            #bind
            #call

            let encoded: Vec<String> = arg.iter().map(|value| value.to_string()).collect();
            std::fs::write(&result_path, encoded.join(" ")).expect("launcher: cannot write result");
        }
    };
    launcher.to_string()
}

/// Panic message (or termination cause) of a failed launcher run.
fn describe_fault(output: &ProcessOutput) -> String {
    let stderr = output.output.stderr_lossy();
    let message = stderr
        .lines()
        .filter(|line| !line.starts_with(BACKTRACE_HINT))
        .collect::<Vec<_>>()
        .join("\n");
    let message = message.trim();

    if message.is_empty() {
        format!("callee terminated with {}", output.termination())
    } else {
        format!(
            "callee terminated with {}: {}{}",
            output.termination(),
            message,
            output.output.stderr_note()
        )
    }
}
