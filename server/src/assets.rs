//! The page and its two images. Anything unrecognized gets the page.

use std::path::PathBuf;

use axum::extract::{FromRef, State};
use axum::http::{header, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::error::AssetError;
use crate::ws::AppState;

#[derive(Debug, Clone)]
pub struct Assets {
    dir: PathBuf,
}

impl FromRef<AppState> for Assets {
    fn from_ref(state: &AppState) -> Self {
        state.assets.clone()
    }
}

/// Map a request path to the file on disk and its content type.
pub fn resolve(path: &str) -> (&'static str, &'static str) {
    match path {
        "/vortex.jpg" => ("vortex.jpg", "image/jpeg"),
        "/gem.png" => ("gem.png", "image/png"),
        _ => ("index.html", "text/html; charset=utf-8"),
    }
}

impl Assets {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn load(&self, file: &str) -> Result<Vec<u8>, AssetError> {
        let path = self.dir.join(file);
        tokio::fs::read(&path).await.map_err(|source| AssetError::Read {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Fallback route serving static assets
pub async fn serve_asset(State(assets): State<Assets>, uri: Uri) -> Response {
    let (file, content_type) = resolve(uri.path());
    match assets.load(file).await {
        Ok(body) => ([(header::CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            tracing::error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_assets() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "vortex-assets-{}-{}",
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<html>vortex</html>").unwrap();
        std::fs::write(dir.join("gem.png"), [0x89, b'P', b'N', b'G']).unwrap();
        dir
    }

    #[test]
    fn unknown_paths_fall_back_to_page() {
        assert_eq!(resolve("/").0, "index.html");
        assert_eq!(resolve("/lobby/whatever").0, "index.html");
        assert_eq!(resolve("/gem.png"), ("gem.png", "image/png"));
        assert_eq!(resolve("/vortex.jpg"), ("vortex.jpg", "image/jpeg"));
    }

    #[tokio::test]
    async fn serves_page_and_images() {
        let assets = Assets::new(temp_assets());

        let page = serve_asset(State(assets.clone()), Uri::from_static("/anything")).await;
        assert_eq!(page.status(), StatusCode::OK);
        assert_eq!(
            page.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );

        let gem = serve_asset(State(assets), Uri::from_static("/gem.png")).await;
        assert_eq!(gem.status(), StatusCode::OK);
        assert_eq!(gem.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn missing_asset_is_a_server_error() {
        // vortex.jpg was never written
        let assets = Assets::new(temp_assets());
        let resp = serve_asset(State(assets.clone()), Uri::from_static("/vortex.jpg")).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // and the page is still served afterwards
        let resp = serve_asset(State(assets), Uri::from_static("/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
