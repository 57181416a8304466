//! `cadence ideate|plan|ship|validate` — single-mode commands.

use std::path::PathBuf;

use cadence_core::mode::{IdeateInput, PlanInput, ShipInput, ValidateInput};
use cadence_core::{Mode, ModeInput, ModeOutput};

use super::{print_done, print_json, Context};

pub async fn ideate(ctx: &Context, prompt: &str, output: Option<PathBuf>) -> Result<(), String> {
    let input = ModeInput::Ideate(IdeateInput {
        prompt: prompt.to_string(),
    });
    run(ctx, Mode::Ideate, input, output).await.map(|_| ())
}

pub async fn plan(
    ctx: &Context,
    prompt: Option<String>,
    from_last: bool,
    from_file: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let vision_document = resolve_predecessor(ctx, Mode::Ideate, from_last, from_file)?
        .map(|v| v.get("vision_document").cloned().unwrap_or(v));
    if vision_document.is_none() && prompt.is_none() {
        return Err("plan needs --from-last, --from-file, or --prompt".into());
    }
    let input = ModeInput::Plan(PlanInput {
        direct_prompt: vision_document.is_none(),
        vision_document,
        prompt,
    });
    run(ctx, Mode::Plan, input, output).await.map(|_| ())
}

pub struct ShipArgs {
    pub prompt: Option<String>,
    pub from_last: bool,
    pub from_file: Option<PathBuf>,
    pub speed: String,
    pub production_url: Option<String>,
    pub artifact_dir: Option<String>,
    pub test_command: Option<String>,
    pub skip_tests: bool,
    pub validate: bool,
    pub output: Option<PathBuf>,
}

pub async fn ship(ctx: &Context, args: ShipArgs) -> Result<(), String> {
    let technical_specification =
        resolve_predecessor(ctx, Mode::Plan, args.from_last, args.from_file)?
            .map(|v| v.get("technical_specification").cloned().unwrap_or(v));
    if technical_specification.is_none() && args.prompt.is_none() {
        return Err("ship needs --from-last, --from-file, or --prompt".into());
    }
    let input = ModeInput::Ship(ShipInput {
        direct_prompt: technical_specification.is_none(),
        technical_specification,
        prompt: args.prompt,
        speed: Some(args.speed),
        production_url: args.production_url,
        artifact_dir: args.artifact_dir,
        test_command: args.test_command,
        skip_tests: args.skip_tests,
    });
    let shipped = run(ctx, Mode::Ship, input, args.output).await?;

    if args.validate {
        let build_output = shipped.to_value();
        let input = ModeInput::Validate(ValidateInput { build_output });
        run(ctx, Mode::Validate, input, None).await?;
    }
    Ok(())
}

pub async fn validate(
    ctx: &Context,
    from_last: bool,
    from_file: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), String> {
    let build_output = resolve_predecessor(ctx, Mode::Ship, from_last, from_file)?
        .ok_or_else(|| "validate needs --from-last or --from-file".to_string())?;
    let input = ModeInput::Validate(ValidateInput { build_output });
    run(ctx, Mode::Validate, input, output).await.map(|_| ())
}

/// Execute one mode in a fresh engine, save the output for chaining, and
/// print it.
async fn run(
    ctx: &Context,
    mode: Mode,
    input: ModeInput,
    output_path: Option<PathBuf>,
) -> Result<ModeOutput, String> {
    let mut orchestrator = ctx.orchestrator()?;
    let output = orchestrator
        .execute_mode(mode, input)
        .await
        .map_err(|e| e.to_string())?;

    ctx.save_output(&output)?;
    let value = output.to_value();
    match &output_path {
        Some(path) => {
            let json = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
            std::fs::write(path, json)
                .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
            println!("Output written to {}", path.display());
        }
        None => print_json(&value),
    }
    print_done(mode, output.session_id());
    Ok(output)
}

/// Resolve the predecessor output a chained mode builds on: a file wins,
/// then the saved state, otherwise nothing (caller falls back to prompt).
fn resolve_predecessor(
    ctx: &Context,
    mode: Mode,
    from_last: bool,
    from_file: Option<PathBuf>,
) -> Result<Option<serde_json::Value>, String> {
    if let Some(path) = from_file {
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        let value = serde_json::from_str(&raw)
            .map_err(|e| format!("invalid JSON in {}: {}", path.display(), e))?;
        return Ok(Some(value));
    }
    if from_last {
        return ctx.load_output(mode).map(Some);
    }
    Ok(None)
}
