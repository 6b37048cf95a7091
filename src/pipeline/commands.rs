//! Assembly of the execute step's shell command list.
//!
//! The list is built as a straight-line accumulation in a fixed order:
//! preparation baseline, input retrieval, workflow invocation, output
//! publication. Later stages assume the working-directory and branch state
//! established by earlier ones, so the order is not negotiable.

use crate::config::Settings;
use crate::pipeline::request::PipelineRequest;

/// The recognized built-in workflow engine identifier.
pub const SNAKEMAKE: &str = "snakemake";

/// The user's workflow choice, resolved once at the API boundary.
///
/// Anything other than the built-in engine identifier is treated as a
/// sequence of literal shell commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workflow {
    Snakemake { location: Option<String> },
    Literal(Vec<String>),
}

impl Workflow {
    pub fn resolve(kind: &str, user_commands: &[String]) -> Self {
        if kind == SNAKEMAKE {
            Workflow::Snakemake {
                location: user_commands.first().cloned(),
            }
        } else {
            Workflow::Literal(user_commands.to_vec())
        }
    }
}

/// Quote `location/filename` for every file and join with single spaces.
///
/// Every path is quoted to tolerate embedded whitespace; an empty location
/// means the repository root and adds no prefix.
pub fn join_files(files: &[String], location: &str) -> String {
    files
        .iter()
        .map(|filename| {
            if location.is_empty() {
                format!("\"{filename}\"")
            } else {
                format!("\"{location}/{filename}\"")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Append the commands that retrieve annexed input content.
///
/// Pure append, no-op for an empty file list, so it composes with the
/// other appenders.
pub fn append_input_commands(files: &[String], settings: &Settings, commands: &mut Vec<String>) {
    if files.is_empty() {
        return;
    }
    commands.push(format!("git annex init {}", settings.publish_branch));
    commands.push(format!("git annex get {}", join_files(files, "")));
}

/// Append the workflow invocation.
pub fn append_workflow_commands(workflow: &Workflow, commands: &mut Vec<String>) {
    match workflow {
        Workflow::Snakemake {
            location: Some(location),
        } => {
            commands.push(format!("snakemake --snakefile {location}/snakefile"));
        }
        Workflow::Snakemake { location: None } => {
            commands.push(SNAKEMAKE.to_string());
        }
        Workflow::Literal(user_commands) => {
            commands.extend(user_commands.iter().cloned());
        }
    }
}

/// Append the commands that publish output files to the publish branch.
///
/// The sequence stashes outputs in a temp directory, switches to (or
/// creates) the publish branch, hard-resets it, moves the outputs into a
/// build-numbered directory, registers large files with the annex, then
/// commits, pushes, and syncs annexed content to the remote. The branch
/// switch must precede the filesystem mutations that follow it.
pub fn append_output_commands(files: &[String], settings: &Settings, commands: &mut Vec<String>) {
    if files.is_empty() {
        return;
    }
    let branch = &settings.publish_branch;

    commands.push("TMPLOC=`mktemp -d`".to_string());
    commands.push(format!("mv {} \"$TMPLOC\"", join_files(files, "")));
    commands.push(format!("git checkout {branch} || git checkout -b {branch}"));
    commands.push("git reset --hard".to_string());
    commands.push("mkdir \"$DRONE_BUILD_NUMBER\"".to_string());
    commands.push(format!(
        "mv {} \"$DRONE_BUILD_NUMBER\"/",
        join_files(files, "$TMPLOC")
    ));
    commands.push(format!(
        "git annex add -c annex.largefiles=\"{}\" \"$DRONE_BUILD_NUMBER\"/",
        settings.annex_largefiles
    ));
    commands.push("git commit \"$DRONE_BUILD_NUMBER\"/ -m \"Back-Push\"".to_string());
    commands.push(format!("git push origin {branch}"));
    commands.push("git annex copy --to=origin --all".to_string());
}

/// Append everything after the preparation baseline: input retrieval,
/// workflow invocation, output publication, in that order.
pub fn append_request_commands(
    settings: &Settings,
    request: &PipelineRequest,
    commands: &mut Vec<String>,
) {
    append_input_commands(&request.input_files, settings, commands);
    let workflow = Workflow::resolve(&request.workflow, &request.user_commands);
    append_workflow_commands(&workflow, commands);
    append_output_commands(&request.output_files, settings, commands);
}

/// The complete command list for the execute step: preparation baseline
/// followed by the request-derived suffix.
pub fn assemble_execute_commands(settings: &Settings, request: &PipelineRequest) -> Vec<String> {
    let mut commands = settings.prep_commands();
    append_request_commands(settings, request, &mut commands);
    commands
}
