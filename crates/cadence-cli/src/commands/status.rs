//! `cadence status|history|agents` — engine introspection.
//!
//! The engine itself is per-process, so these commands report the
//! built-in configuration plus what the state directory holds from
//! earlier invocations.

use cadence_core::Mode;

use super::{print_json, Context};

pub async fn status(ctx: &Context) -> Result<(), String> {
    let orchestrator = ctx.orchestrator()?;
    let mut view = orchestrator.status();

    // Overlay the cross-invocation picture from the state directory.
    let saved: Vec<String> = Mode::all()
        .iter()
        .filter(|m| ctx.load_output(**m).is_ok())
        .map(|m| m.to_string())
        .collect();
    if let Some(obj) = view.as_object_mut() {
        obj.insert("saved_outputs".into(), serde_json::json!(saved));
        obj.insert(
            "state_dir".into(),
            serde_json::json!(ctx.state_dir().display().to_string()),
        );
    }
    print_json(&view);
    Ok(())
}

pub async fn history(ctx: &Context, mode: Option<&str>) -> Result<(), String> {
    let mode = match mode {
        Some(raw) => Some(Mode::from_str(raw).ok_or_else(|| format!("unknown mode '{}'", raw))?),
        None => None,
    };
    let modes: Vec<Mode> = match mode {
        Some(m) => vec![m],
        None => Mode::all().to_vec(),
    };
    let mut entries = Vec::new();
    for m in modes {
        if let Ok(output) = ctx.load_output(m) {
            entries.push(serde_json::json!({
                "mode": m,
                "session_id": output.get("session_id"),
                "output": output,
            }));
        }
    }
    print_json(&serde_json::json!({ "history": entries }));
    Ok(())
}

pub async fn agents(ctx: &Context) -> Result<(), String> {
    let orchestrator = ctx.orchestrator()?;
    print_json(&orchestrator.agents().summary());
    Ok(())
}
