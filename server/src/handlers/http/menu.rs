use std::convert::Infallible;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use shared::types::menu::active_index;
use shared::types::{BACKOFFICE_MENU, MAIN_MENU, MENUS_JSON, MenuItem};

use crate::AppState;
use crate::handlers::http::utils::{deliver_json, deliver_serialized_json};

#[derive(Debug, Serialize)]
struct ActiveEntries {
    main: Option<usize>,
    backoffice: Option<usize>,
}

#[derive(Debug, Serialize)]
struct MenusWithActive {
    main: &'static [MenuItem],
    backoffice: &'static [MenuItem],
    active: ActiveEntries,
}

/// Both navigation trees. With `?path=<page>` the reply also names the
/// top-level entry of each tree to highlight for that page.
pub async fn handle_menu<B>(
    req: Request<B>,
    _state: AppState,
) -> Result<Response<BoxBody<Bytes, Infallible>>> {
    let page = req.uri().query().and_then(|q| {
        form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == "path")
            .map(|(_, v)| v.into_owned())
    });

    let Some(page) = page else {
        return deliver_json(MENUS_JSON.as_str().to_owned(), StatusCode::OK);
    };

    deliver_serialized_json(
        &MenusWithActive {
            main: MAIN_MENU,
            backoffice: BACKOFFICE_MENU,
            active: ActiveEntries {
                main: active_index(MAIN_MENU, &page),
                backoffice: active_index(BACKOFFICE_MENU, &page),
            },
        },
        StatusCode::OK,
    )
}
