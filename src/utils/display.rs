//! Coloured terminal output.

use colored::*;

use crate::models::{Priority, TestCase};

pub fn print_success(message: &str) {
    println!("{}", format!("✓ {}", message).green());
}

pub fn print_error(message: &str) {
    eprintln!("{}", format!("✗ {}", message).red());
}

pub fn print_info(message: &str) {
    println!("{}", format!("ℹ {}", message).cyan());
}

pub fn print_warning(message: &str) {
    println!("{}", format!("! {}", message).yellow());
}

pub fn print_banner(title: &str) {
    let rule = "=".repeat(60);
    println!("{}", rule.yellow());
    println!("{}", title.yellow());
    println!("{}\n", rule.yellow());
}

fn priority_label(priority: Priority) -> ColoredString {
    match priority {
        Priority::High => priority.as_str().red().bold(),
        Priority::Medium => priority.as_str().yellow(),
        Priority::Low => priority.as_str().green(),
    }
}

/// Pretty print a single test case; `index` is 1-based.
pub fn print_test_case(tc: &TestCase, index: usize) {
    let rule = "=".repeat(80);
    println!("\n{}", rule.yellow());
    println!("{}", format!("Test Case {}: {}", index, tc.title).yellow());
    println!("{}", rule.yellow());

    if !tc.description.is_empty() {
        println!("\n{}", "Description:".cyan());
        println!("  {}", tc.description);
    }

    if !tc.preconditions.is_empty() {
        println!("\n{}", "Preconditions:".cyan());
        for precondition in &tc.preconditions {
            println!("  • {}", precondition);
        }
    }

    println!("\n{}", "Steps:".cyan());
    for (i, step) in tc.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    println!("\n{}", "Expected Result:".cyan());
    println!("  {}", tc.expected_result);

    println!("\n{} {}", "Type:".cyan(), tc.test_type);
    println!("{} {}", "Priority:".cyan(), priority_label(tc.priority));
}

pub fn print_test_cases(test_cases: &[TestCase]) {
    for (i, tc) in test_cases.iter().enumerate() {
        print_test_case(tc, i + 1);
    }
}
