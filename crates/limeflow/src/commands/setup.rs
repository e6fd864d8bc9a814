use colored::Colorize;

/// Apps Script implementing the store contract: GET returns cell A1 (or an
/// empty array), POST replaces it with the request body.
pub const APPS_SCRIPT: &str = r#"function doGet(e) {
  var sheet = SpreadsheetApp.getActiveSpreadsheet().getActiveSheet();
  var data = sheet.getRange("A1").getValue();
  if (!data) return ContentService.createTextOutput("[]");
  return ContentService.createTextOutput(data);
}

function doPost(e) {
  var sheet = SpreadsheetApp.getActiveSpreadsheet().getActiveSheet();
  var data = e.postData.contents;
  sheet.getRange("A1").setValue(data);
  return ContentService.createTextOutput(JSON.stringify({result: "success"}));
}"#;

/// Run the setup command.
pub fn run() {
    println!("{}", "Turn a Google Sheet into a LimeFlow store".bold());
    println!();
    println!("  1. Create a new Google Sheet.");
    println!("  2. Open Extensions > Apps Script and replace the code with:");
    println!();
    for line in APPS_SCRIPT.lines() {
        println!("       {}", line.cyan());
    }
    println!();
    println!("  3. Deploy > New deployment > Web app.");
    println!(
        "     Set \"Who has access\" to {}; anything else returns a sign-in page.",
        "Anyone".bold()
    );
    println!("  4. Copy the web app URL and run:");
    println!();
    println!("       {}", "limeflow connect <WEB_APP_URL>".green());
}
