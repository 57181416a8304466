//! `cadence full|rapid|express` — macro workflow commands.

use super::{print_json, Context};

pub async fn run(ctx: &Context, workflow: &str, prompt: &str) -> Result<(), String> {
    let mut orchestrator = ctx.orchestrator()?;

    // Echo progress events while the workflow runs.
    let mut events = orchestrator.events().subscribe();
    let echo = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Ok(line) = serde_json::to_string(&event) {
                eprintln!("{} {}", console::style("•").dim(), line);
            }
        }
    });

    let result = match workflow {
        "full" => orchestrator.full_lifecycle(prompt).await,
        "rapid" => orchestrator.rapid(prompt).await,
        "express" => orchestrator.express(prompt).await,
        other => return Err(format!("unknown workflow '{}'", other)),
    };
    echo.abort();

    let output = result.map_err(|e| e.to_string())?;
    ctx.save_output(&output)?;
    print_json(&output.to_value());
    println!(
        "{} {} workflow complete",
        console::style("✔").green(),
        workflow
    );
    Ok(())
}
