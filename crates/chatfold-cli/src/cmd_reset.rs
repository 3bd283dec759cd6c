use chatfold_store::StorePaths;

use crate::settings::App;

/// `chatfold reset`: drop the session's navigation context.
pub fn execute(paths: StorePaths) -> anyhow::Result<()> {
    let mut app = App::open(paths)?;
    match app.ctx.get() {
        Some(rec) => println!("cleared context for {} ({})", rec.url, rec.folder_name),
        None => println!("no navigation context"),
    }
    app.ctx.clear();
    Ok(())
}
