// Common test utilities and fixtures

use std::path::PathBuf;
use tempfile::TempDir;

pub mod backend_stub;

/// Mock HTML pages for testing
pub mod fixtures {
    /// A form where every field carries a proper label
    pub const LABELED_FORM: &str = r#"
    <!DOCTYPE html>
    <html>
    <head><title>Application</title></head>
    <body>
        <h1>Job Application</h1>
        <form>
            <label for="name">What is your full name?</label>
            <input type="text" id="name">
            <label for="motivation">Why do you want to work here?</label>
            <textarea id="motivation"></textarea>
            <button type="submit">Submit</button>
        </form>
    </body>
    </html>
    "#;

    /// Fields identified only by placeholder or aria-label
    pub const UNLABELED_FORM: &str = r#"
    <!DOCTYPE html>
    <html>
    <head><title>Signup</title></head>
    <body>
        <h2>Tell us about yourself</h2>
        <input type="email" placeholder="Your email address">
        <input type="text" aria-label="Preferred username">
        <input type="text">
    </body>
    </html>
    "#;

    /// A rich-text editor region below a heading
    #[allow(dead_code)]
    pub const EDITABLE_PAGE: &str = r#"
    <!DOCTYPE html>
    <html>
    <head><title>Editor</title></head>
    <body>
        <section class="question-card">
            <h3>Describe your proudest achievement</h3>
            <div contenteditable="true" class="answer-box"></div>
        </section>
    </body>
    </html>
    "#;

    /// A page with more prose than the context budget allows
    #[allow(dead_code)]
    pub const LONG_CONTENT_PAGE_HEAD: &str = r#"
    <!DOCTYPE html>
    <html>
    <head><title>Long Read</title></head>
    <body>
        <main>
            <h1>Chapter One</h1>
    "#;

    #[allow(dead_code)]
    pub const LONG_CONTENT_PAGE_TAIL: &str = r#"
        </main>
        <input type="text" id="notes">
    </body>
    </html>
    "#;
}

/// Helper to create a test HTML file
#[allow(dead_code)]
pub fn create_test_html(content: &str) -> PathBuf {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("test.html");
    std::fs::write(&file_path, content).expect("Failed to write test HTML");

    // Leak the temp_dir to keep it alive for the test
    std::mem::forget(temp_dir);
    file_path
}
