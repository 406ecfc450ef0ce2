//! Residual history output.

/// Print a residual history and its convergence summary.
///
/// Without `verbose` only the first and last iterations are listed.
pub fn print_history(history: &[f64], verbose: bool) {
    let Some((&initial, _)) = history.split_first() else {
        return;
    };
    let last = history.len() - 1;

    println!("{:>6}  {:>14}", "iter", "residual");
    for (k, &res) in history.iter().enumerate() {
        if verbose || k == 0 || k == last {
            println!("{:>6}  {:>14.6e}", k, res);
        }
    }
    println!();

    let (reduction, rate) = convergence(history);
    if initial == 0.0 {
        println!("Initial residual is zero");
        return;
    }
    println!("Reduction:   {:.3e}", reduction);
    println!("Avg factor:  {:.4} per iteration", rate);
}

/// Total reduction `r_K / r_0` and geometric-mean factor per iteration.
pub fn convergence(history: &[f64]) -> (f64, f64) {
    match (history.first(), history.last()) {
        (Some(&first), Some(&last)) if first > 0.0 && history.len() > 1 => {
            let reduction = last / first;
            let rate = reduction.powf(1.0 / (history.len() - 1) as f64);
            (reduction, rate)
        }
        _ => (1.0, 1.0),
    }
}
