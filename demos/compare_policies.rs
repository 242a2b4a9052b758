//! Compare every decision policy on the same five slot machines.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example compare_policies
//! RUST_LOG=banditsim=debug cargo run --example compare_policies
//! ```

use banditsim::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Define the true reward probabilities for each arm
    let probabilities = [0.1, 0.4, 0.45, 0.6, 0.61];
    let rounds = 1000;

    println!("banditsim: Multi-Armed Bandit Policy Comparison\n");
    println!("{}", "=".repeat(60));
    println!("True success probabilities:");
    for (arm, p) in probabilities.iter().enumerate() {
        println!("  slot #{}: {:.2}", arm + 1, p);
    }
    println!("{}", "=".repeat(60));

    let reports = Comparison::new(probabilities, rounds)
        .seed(42)
        .run(&PolicyKind::all())?;

    for report in &reports {
        println!("\n{}", report.policy());
        println!("{}", "-".repeat(report.policy().len()));
        println!("  Total regret: {:.2}", report.total_regret());

        let plays = report.play_counts();
        for (arm, estimate) in report.success_prob().iter().enumerate() {
            let estimate = estimate.map_or("n/a".to_string(), |p| format!("{p:.3}"));
            println!(
                "  slot #{}: {:4} plays ({:5.1}%), estimated success rate {}",
                arm + 1,
                plays[arm],
                100.0 * plays[arm] as f64 / rounds as f64,
                estimate
            );
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("Cumulative regret by round:");
    print!("{:>8}", "round");
    for report in &reports {
        print!("{:>22}", report.policy());
    }
    println!();
    for round in (99..rounds).step_by(100) {
        print!("{:>8}", round + 1);
        for report in &reports {
            print!("{:>22.2}", report.regret_trace()[round]);
        }
        println!();
    }

    Ok(())
}
