//! `poll` subcommand: ask every configured app once, touch no light.

use super::{GlobalOpts, PollOutput, Result, SourcePollJson, kv, kv_width, load_context, print_json};

pub(super) fn cmd_poll(opts: &GlobalOpts) -> Result<()> {
    let ctx = load_context(opts)?;
    let sources = ctx.build_sources()?;

    // No short-circuit: every source gets a result.
    let results: Vec<SourcePollJson> = sources
        .iter()
        .map(|source| match source.is_busy() {
            Ok(busy) => SourcePollJson {
                name: source.name().to_string(),
                busy: Some(busy),
                error: None,
            },
            Err(e) => SourcePollJson {
                name: source.name().to_string(),
                busy: None,
                error: Some(e.to_string()),
            },
        })
        .collect();
    let busy = results.iter().any(|r| r.busy == Some(true));

    if opts.json {
        return print_json(&PollOutput {
            busy,
            sources: results,
        });
    }

    let keys: Vec<String> = results.iter().map(|r| format!("{}:", r.name)).collect();
    let mut key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    key_refs.push("Aggregate:");
    let w = kv_width(&key_refs, &[]);

    for (key, result) in keys.iter().zip(&results) {
        match (&result.busy, &result.error) {
            (Some(true), _) => kv(key, "busy", w),
            (Some(false), _) => kv(key, "idle", w),
            (None, Some(e)) => kv(key, format_args!("error ({e})"), w),
            (None, None) => kv(key, "unknown", w),
        }
    }
    println!();
    kv("Aggregate:", if busy { "busy" } else { "idle" }, w);
    Ok(())
}
