use revsync_core::config::AppConfig;
use revsync_core::db::ReviewRepository;

use crate::commands::common::{
    format_review_lines, open_service, review_to_list_item, ReviewListItem,
};
use crate::error::CliError;

pub async fn run_list(limit: usize, as_json: bool, config: &AppConfig) -> Result<(), CliError> {
    let service = open_service(config).await?;
    let reviews = service.list(limit, 0).await?;

    if as_json {
        let json_items = reviews
            .iter()
            .map(review_to_list_item)
            .collect::<Vec<ReviewListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if reviews.is_empty() {
        println!("No reviews found.");
        return Ok(());
    }

    for line in format_review_lines(&reviews) {
        println!("{line}");
    }
    Ok(())
}
