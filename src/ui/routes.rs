//! # Web Server Routes for the Walkthrough UI
//!
//! A static page at `/`, JSON endpoints under `/api` for front ends, and an
//! HTML fragment endpoint the page posts its form to.

use crate::config::WalkthroughConfig;
use crate::pipeline::{Walkthrough, EXAMPLE_TEXTS};
use crate::stage::{Stage, StageInfo};
use crate::tokenizer::WordPieceTokenizer;
use actix_files::NamedFile;
use actix_web::{web, App, Error, HttpResponse, HttpServer, Responder};
use html_escape::encode_text;
use log::{debug, info};
use serde::Deserialize;

const INDEX_HTML: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/src/ui/index.html");

/// Read-only state shared by every worker.
#[derive(Debug)]
pub struct AppState {
    pub config: WalkthroughConfig,
    pub tokenizer: WordPieceTokenizer,
}

#[derive(Debug, Deserialize)]
pub struct WalkthroughRequest {
    #[serde(default)]
    pub text: String,
}

fn compute(state: &AppState, text: &str) -> Walkthrough {
    let mut rng = rand::thread_rng();
    let walkthrough = Walkthrough::compute(text, &state.config, &state.tokenizer, &mut rng);
    debug!("Served walkthrough {} ({} tokens)", walkthrough.run_id, walkthrough.sequence.len());
    walkthrough
}

/// Serves `index.html`.
pub async fn index() -> Result<NamedFile, Error> {
    Ok(NamedFile::open_async(INDEX_HTML).await?)
}

pub async fn examples() -> impl Responder {
    HttpResponse::Ok().json(EXAMPLE_TEXTS)
}

pub async fn stages() -> impl Responder {
    let stages: Vec<StageInfo> = Stage::ALL.iter().map(Stage::info).collect();
    HttpResponse::Ok().json(stages)
}

/// Full walkthrough for `{"text": ...}` as a `WalkthroughReport`.
pub async fn walkthrough_json(state: web::Data<AppState>, request: web::Json<WalkthroughRequest>) -> impl Responder {
    let walkthrough = compute(&state, &request.text);
    HttpResponse::Ok().json(walkthrough.report())
}

/// Token table for a form-encoded `text` field, as an HTML fragment.
pub async fn walkthrough_fragment(
    state: web::Data<AppState>,
    form: web::Form<WalkthroughRequest>,
) -> impl Responder {
    let walkthrough = compute(&state, &form.text);
    HttpResponse::Ok().content_type("text/html").body(token_table_html(&walkthrough))
}

fn token_table_html(walkthrough: &Walkthrough) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<h2>Tokens for &quot;{}&quot;</h2>",
        encode_text(&walkthrough.input_text)
    ));
    html.push_str("<table class=\"tokens\"><tr><th>Position</th><th>Token</th><th>ID</th><th>Type</th></tr>");
    for (position, ((token, id), kind)) in walkthrough
        .sequence
        .tokens()
        .iter()
        .zip(&walkthrough.token_ids)
        .zip(walkthrough.sequence.kinds())
        .enumerate()
    {
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            kind.to_string().to_lowercase(),
            position,
            encode_text(token),
            id,
            kind
        ));
    }
    html.push_str("</table>");

    let stats = walkthrough.sequence.stats();
    html.push_str(&format!(
        "<p>Total: {} &middot; Content: {} &middot; Special: {} &middot; Padding: {}</p>",
        stats.total, stats.content, stats.special, stats.padding
    ));
    if walkthrough.sequence.is_truncated() {
        html.push_str("<p class=\"warning\">Input was truncated to fit the sequence length.</p>");
    }
    html
}

/// Registers every route. `AppState` must be added as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/api/examples", web::get().to(examples))
        .route("/api/stages", web::get().to(stages))
        .route("/api/walkthrough", web::post().to(walkthrough_json))
        .route("/walkthrough", web::post().to(walkthrough_fragment));
}

/// Initializes and runs the Actix web server on `host:port`.
pub async fn run_server(
    config: WalkthroughConfig,
    tokenizer: WordPieceTokenizer,
    host: &str,
    port: u16,
) -> std::io::Result<()> {
    let state = web::Data::new(AppState { config, tokenizer });
    info!("Starting server at http://{}:{}/", host, port);
    HttpServer::new(move || App::new().app_data(state.clone()).configure(configure))
        .bind((host, port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::build_tokenizer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn walkthrough(text: &str) -> Walkthrough {
        let config = WalkthroughConfig::default();
        let tokenizer = build_tokenizer(&config).unwrap();
        Walkthrough::compute(text, &config, &tokenizer, &mut StdRng::seed_from_u64(2))
    }

    #[test]
    fn test_token_table_html_escapes_input() {
        let html = token_table_html(&walkthrough("<b>cat</b>"));
        assert!(html.contains("&lt;b&gt;cat&lt;/b&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_token_table_html_rows() {
        let html = token_table_html(&walkthrough("The cat sat on the mat"));
        assert_eq!(html.matches("<tr class=").count(), 12);
        assert!(html.contains("<td>[CLS]</td><td>101</td>"));
        assert!(html.contains("<tr class=\"word\"><td>2</td><td>cat</td><td>4937</td><td>Word</td></tr>"));
    }
}
