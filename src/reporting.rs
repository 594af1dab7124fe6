use crate::runner::RunSummary;

pub fn print_summary(summary: &RunSummary) {
    println!("\n=== Scenario {} ===", summary.scenario);
    println!("\n[observed]\n{}", summary.observed);
    if let Some(forecast) = &summary.forecast {
        println!("\n[forecast]\n{forecast}");
    }
    if let Some(comparison) = &summary.comparison {
        println!("\n{comparison}");
    }
}
