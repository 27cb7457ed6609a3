// Library-level insertion tests against a live browser. These target the
// same field twice in one session, which the binary tests cannot do.

use anyhow::Result;
use fieldpilot::browser::{Browser, BrowserType};
use fieldpilot::detector;
use fieldpilot::inserter::{self, InsertOptions};

mod common;
use common::fixtures;

async fn field_for(browser: &Browser, selector: &str) -> Result<fieldpilot::FieldInfo> {
    detector::install(browser).await?;
    detector::describe(browser, selector, None)
        .await?
        .ok_or_else(|| anyhow::anyhow!("fixture field {} missing", selector))
}

#[tokio::test]
#[ignore = "requires geckodriver"]
async fn test_inserting_the_same_answer_twice_leaves_the_value_unchanged() -> Result<()> {
    let page = common::create_test_html(fixtures::LABELED_FORM);
    let url = format!("file://{}", page.display());

    let browser = Browser::new(BrowserType::Firefox, None, true).await?;
    let result = async {
        browser.goto(&url).await?;
        let field = field_for(&browser, "#name").await?;

        inserter::insert(&browser, &field, "Jane Doe", InsertOptions::default()).await?;
        inserter::insert(&browser, &field, "Jane Doe", InsertOptions::default()).await?;

        let value = browser
            .execute("return document.querySelector('#name').value;", vec![])
            .await?;
        assert_eq!(value.as_str(), Some("Jane Doe"));
        Ok(())
    }
    .await;

    browser.close().await?;
    result
}

#[tokio::test]
#[ignore = "requires geckodriver"]
async fn test_double_insert_into_editable_region_does_not_duplicate() -> Result<()> {
    let page = common::create_test_html(fixtures::EDITABLE_PAGE);
    let url = format!("file://{}", page.display());

    let browser = Browser::new(BrowserType::Firefox, None, true).await?;
    let result = async {
        browser.goto(&url).await?;
        let field = field_for(&browser, ".answer-box").await?;

        inserter::insert(&browser, &field, "Shipped the v2 rewrite", InsertOptions::default())
            .await?;
        inserter::insert(&browser, &field, "Shipped the v2 rewrite", InsertOptions::default())
            .await?;

        let text = browser
            .execute(
                "return document.querySelector('.answer-box').textContent;",
                vec![],
            )
            .await?;
        assert_eq!(text.as_str(), Some("Shipped the v2 rewrite"));
        Ok(())
    }
    .await;

    browser.close().await?;
    result
}
