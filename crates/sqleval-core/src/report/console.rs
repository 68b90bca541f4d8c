use super::{DistillSummary, EvalSummary};

pub fn print_eval_summary(model: &str, s: &EvalSummary) {
    eprintln!("\nEvaluation of {} ({} entries)", model, s.total);
    eprintln!("  ✅ correct:          {}", s.correct);
    eprintln!("  ❌ incorrect:        {}", s.incorrect);
    eprintln!("  ⚠️  execution errors: {}", s.execution_errors);
    match s.accuracy {
        Some(a) => eprintln!("Accuracy: {:.4}", a),
        None => eprintln!("Accuracy: n/a (no entries)"),
    }
}

pub fn print_distill_summary(teacher: &str, s: &DistillSummary) {
    eprintln!("\nDistillation with {} ({} entries)", teacher, s.total);
    eprintln!("  ✅ verified:   {}", s.verified);
    eprintln!("  ❌ rejected:   {}", s.rejected);
    eprintln!("  ⏳ unverified: {}", s.pending);
    eprintln!("  ⚠️  failed:     {}", s.failed);
    match s.verification_rate {
        Some(r) => eprintln!("Verification rate: {:.4}", r),
        None => eprintln!("Verification rate: n/a (no entries)"),
    }
}
