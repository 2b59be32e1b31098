use colored::*;

pub struct ExampleStory {
    pub title: &'static str,
    pub story: &'static str,
}

pub const EXAMPLE_STORIES: &[ExampleStory] = &[
    ExampleStory {
        title: "Login Feature",
        story: "As a user, I want to login with email and password so that I can access my personalized dashboard",
    },
    ExampleStory {
        title: "Shopping Cart",
        story: "As a customer, I want to add items to my cart and checkout so that I can purchase products",
    },
    ExampleStory {
        title: "Password Reset",
        story: "As a user, I want to reset my password via email so that I can regain access if I forget it",
    },
    ExampleStory {
        title: "File Upload",
        story: "As a user, I want to upload profile pictures up to 5MB so that I can personalize my account",
    },
    ExampleStory {
        title: "Search Feature",
        story: "As a user, I want to search products by name, category, or price range so that I can find items quickly",
    },
];

pub const EXAMPLE_COMMANDS: &[(&str, &str)] = &[
    ("Basic usage", "test_case_generator generate \"Your user story here\""),
    ("Generate more tests", "test_case_generator generate \"Your story\" --count 10"),
    ("Focus on security", "test_case_generator generate \"Your story\" --focus security"),
    ("Save to file", "test_case_generator generate \"Your story\" --output tests.md"),
    ("Export as CSV", "test_case_generator generate \"Your story\" --output tests.csv"),
    ("Batch processing", "test_case_generator batch user_stories.txt --output-dir test_output"),
];

/// Show example user stories and commands.
pub fn show_examples() {
    println!("\n{}\n", "Example User Stories:".yellow());
    for (i, example) in EXAMPLE_STORIES.iter().enumerate() {
        println!("{}", format!("{}. {}", i + 1, example.title).cyan());
        println!("   {}\n", example.story);
    }

    println!("\n{}\n", "Example Commands:".yellow());
    for (description, command) in EXAMPLE_COMMANDS {
        println!("{}", format!("{}:", description).cyan());
        println!("  {}\n", command);
    }
}
