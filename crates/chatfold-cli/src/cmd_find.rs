use chatfold_store::StorePaths;

use crate::settings::App;

/// `chatfold find <url>`
pub fn execute(paths: StorePaths, url: &str, json: bool) -> anyhow::Result<()> {
    let app = App::open(paths)?;
    let found = app.store.find_folders_by_url(url);
    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }
    if !found.is_saved() {
        println!("Not Saved");
        return Ok(());
    }
    println!("Saved in: {}", found.matching_folder_names.join(", "));
    if let Some(title) = &found.first_matched_title {
        println!("Title: {title}");
    }
    Ok(())
}
