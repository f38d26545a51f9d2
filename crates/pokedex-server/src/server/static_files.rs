use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
};
use tracing::warn;

use crate::state::AppState;

/// Serve the upload page exactly as it sits on disk
pub async fn index(State(state): State<AppState>) -> Response {
    let path = &state.config.index_path;
    match tokio::fs::read(path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], bytes).into_response(),
        Err(e) => {
            warn!("Index page {} unavailable ({}), serving fallback", path.display(), e);
            Html(FALLBACK_HTML).into_response()
        }
    }
}

pub const FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Pokedex</title>
</head>
<body>
    <h1>Pokedex</h1>
    <p>Upload a picture of a Pok&eacute;mon to identify it.</p>
    <form id="upload" action="/analyze" method="post" enctype="multipart/form-data">
        <input type="file" name="file" accept="image/*" required>
        <button type="submit">Analyze</button>
    </form>
    <p id="result"></p>
    <script>
        document.getElementById('upload').addEventListener('submit', async (event) => {
            event.preventDefault();
            const result = document.getElementById('result');
            result.textContent = 'Analyzing...';
            const response = await fetch('/analyze', { method: 'POST', body: new FormData(event.target) });
            const body = await response.json();
            result.textContent = response.ok ? 'Result = ' + body.result : body.error.message;
        });
    </script>
</body>
</html>
"#;
