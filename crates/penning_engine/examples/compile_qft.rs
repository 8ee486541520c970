//! Penning QFT compilation demo
//!
//! Compiles the 8-qubit QFT on the Penning grid and prints the search
//! summary, per-ion temperature terms and the JSON export.
//!
//! Usage: `cargo run --example compile_qft [quick|thorough]`

use penning_core::PenningResult;
use penning_engine::prelude::*;

fn main() -> PenningResult<()> {
    let config = match std::env::args().nth(1).as_deref() {
        Some("quick") => CompilerConfig::quick(),
        Some("thorough") => CompilerConfig::thorough(),
        _ => CompilerConfig::default_8q(),
    };

    println!("═══════════════════════════════════════════════════════════════════════");
    println!("  Penning trap QFT compiler");
    println!("═══════════════════════════════════════════════════════════════════════\n");
    println!("  • {}", config);
    println!("  • {}", config.planner);
    println!("  • {}\n", config.weights);

    let compiler = PenningCompiler::penning(config)?;
    let result = compiler.compile_qft()?;

    println!("Result: {}", result);
    println!("  • Improvement: {:.3}", result.improvement());
    println!("  • Accepted moves: {}", result.improvements);
    println!("  • Time: {} ms\n", result.elapsed.as_millis());

    println!("┌──────┬──────────┬──────────┬──────────┬──────────┐");
    println!("│ Ion  │ Shuttles │ MS gates │ MS heat  │ Dwell    │");
    println!("├──────┼──────────┼──────────┼──────────┼──────────┤");
    for stats in &result.report.per_ion {
        println!(
            "│ {:4} │ {:8} │ {:8} │ {:8} │ {:8} │",
            stats.ion, stats.shuttles, stats.ms_count, stats.ms_heat, stats.dwell_steps
        );
    }
    println!("└──────┴──────────┴──────────┴──────────┴──────────┘\n");

    println!("{}", compiler.export_json(&result)?);
    Ok(())
}
