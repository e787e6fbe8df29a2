//! Request handlers

use std::sync::Arc;

use axum::{extract::State, response::Html, Json};
use tracing::info;

use crate::predictor::{FormSchema, UserSelections};

use super::error::Result;
use super::state::AppState;

// ============================================================================
// Schema Handler
// ============================================================================

/// Field domains and numeric bounds the form may offer.
pub async fn get_schema(State(state): State<Arc<AppState>>) -> Json<FormSchema> {
    Json(state.predictor.schema())
}

// ============================================================================
// Prediction Handler
// ============================================================================

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(selections): Json<UserSelections>,
) -> Result<Json<serde_json::Value>> {
    let prediction = state.predictor.predict(&selections)?;

    info!(
        prediction = prediction.label(),
        job = %selections.job,
        mon = %selections.mon,
        "Prediction served"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "prediction": prediction.code(),
        "label": prediction.label(),
        "message": prediction.message(),
    })))
}

// ============================================================================
// System Handlers
// ============================================================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": uptime.num_seconds(),
    }))
}

// ============================================================================
// UI Handler
// ============================================================================

pub async fn serve_index() -> Html<String> {
    // Embedded HTML for portability
    Html(EMBEDDED_INDEX_HTML.to_string())
}

const EMBEDDED_INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Insurance Subscription Prediction</title>
    <style>
        body{font-family:system-ui,sans-serif;background:#111827;color:#f3f4f6;max-width:640px;margin:2rem auto;padding:0 1rem}
        h1{font-size:1.4rem}
        label{display:block;margin-top:.8rem;font-size:.9rem;color:#9ca3af}
        select,input{width:100%;padding:.4rem;margin-top:.2rem;background:#1f2937;color:#f3f4f6;border:1px solid #374151;border-radius:4px}
        button{margin-top:1.2rem;padding:.5rem 1.4rem;background:#2563eb;color:white;border:none;border-radius:4px;cursor:pointer}
        #result{margin-top:1.2rem;padding:.8rem;border-radius:4px;display:none}
        .yes{background:#064e3b}.no{background:#7f1d1d}.err{background:#78350f}
        output{float:right;color:#f3f4f6}
    </style>
</head>
<body>
    <h1>Insurance Subscription Prediction</h1>
    <h2 style="font-size:1rem;color:#9ca3af">Enter the Customer Details:</h2>
    <form id="form"></form>
    <button id="go">Predict</button>
    <div id="result"></div>
    <script>
        const CATEGORICAL_TITLES = {
            job: 'Job', marital: 'Marital Status', education_qual: 'Education Qualification',
            call_type: 'Call Type', prev_outcome: 'Previous Outcome', mon: 'Month'
        };
        const NUMERIC_TITLES = { age: 'Age', day: 'Day', dur: 'Duration', num_calls: 'Number of Calls' };

        async function build() {
            const schema = await (await fetch('/api/schema')).json();
            const form = document.getElementById('form');
            for (const field of schema.categorical) {
                const options = field.options.map(o => `<option>${o}</option>`).join('');
                form.insertAdjacentHTML('beforeend',
                    `<label>${CATEGORICAL_TITLES[field.name]}<select name="${field.name}">${options}</select></label>`);
            }
            for (const field of schema.numeric) {
                form.insertAdjacentHTML('beforeend',
                    `<label>${NUMERIC_TITLES[field.name]}<output>${field.default}</output>
                     <input type="range" name="${field.name}" min="${field.min}" max="${field.max}" value="${field.default}"
                      oninput="this.parentElement.querySelector('output').value=this.value"></label>`);
            }
        }

        document.getElementById('go').addEventListener('click', async () => {
            const data = {};
            for (const el of document.getElementById('form').elements) {
                data[el.name] = el.type === 'range' ? parseInt(el.value, 10) : el.value;
            }
            const resp = await fetch('/api/predict', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(data),
            });
            const body = await resp.json();
            const result = document.getElementById('result');
            result.style.display = 'block';
            if (resp.ok) {
                result.className = body.label === 'yes' ? 'yes' : 'no';
                result.textContent = body.message;
            } else {
                result.className = 'err';
                result.textContent = body.message;
            }
        });

        build();
    </script>
</body>
</html>"#;
