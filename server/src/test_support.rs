//! Fixtures shared by the unit tests: synthetic photos with EXIF, in-memory
//! backends and a ready-made `AppState`.

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use exif::experimental::Writer;
use http_body_util::Full;
use hyper::{Request, header};
use exif::{Field, In, Rational, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use serde_json::Value as Json;
use shared::config::LiveConfig;
use shared::types::{
    AppConfig, AuthConfig, BackendConfig, CertificateConfig, Environment, NewAccount, PathsConfig,
    ServerConfig, SiteConfig, UserRole,
};

use crate::AppState;
use crate::backend::{
    AuthBackend, BackendError, BackendErrorKind, BackendSession, BackendUser,
    CertificateGenerator, GeneratorError,
};

pub const TEST_SECRET: &str = "test-secret-test-secret-test-secret!";

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

pub struct ExifSpec {
    pub make: &'static str,
    pub model: &'static str,
    pub taken: &'static str,
    pub orientation: u16,
    /// ((deg, min, sec, ref), (deg, min, sec, ref))
    pub gps: Option<((u32, u32, u32, &'static str), (u32, u32, u32, &'static str))>,
}

impl ExifSpec {
    /// 51°30'36" N, 7°27'54" W, turned 90° clockwise.
    pub fn dortmund() -> Self {
        Self {
            make: "Canon",
            model: "EOS 5D",
            taken: "2024:04:24 10:15:00",
            orientation: 6,
            gps: Some(((51, 30, 36, "N"), (7, 27, 54, "W"))),
        }
    }
}

pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([40, 120, 40]));
    let mut out = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut out, 90))
        .expect("encode fixture");
    out
}

fn ascii(tag: Tag, s: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![s.as_bytes().to_vec()]),
    }
}

fn rationals(tag: Tag, (d, m, s): (u32, u32, u32)) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Rational(vec![
            Rational { num: d, denom: 1 },
            Rational { num: m, denom: 1 },
            Rational { num: s, denom: 1 },
        ]),
    }
}

/// JPEG with an APP1 EXIF segment spliced in right after SOI.
pub fn jpeg_with_exif(width: u32, height: u32, spec: &ExifSpec) -> Vec<u8> {
    let mut fields = vec![
        ascii(Tag::Make, spec.make),
        ascii(Tag::Model, spec.model),
        ascii(Tag::DateTimeOriginal, spec.taken),
        Field {
            tag: Tag::Orientation,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![spec.orientation]),
        },
    ];
    if let Some(((ld, lm, ls, lref), (gd, gm, gs, gref))) = spec.gps {
        fields.push(rationals(Tag::GPSLatitude, (ld, lm, ls)));
        fields.push(ascii(Tag::GPSLatitudeRef, lref));
        fields.push(rationals(Tag::GPSLongitude, (gd, gm, gs)));
        fields.push(ascii(Tag::GPSLongitudeRef, gref));
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).expect("write exif");
    let tiff = tiff.into_inner();

    let jpeg = plain_jpeg(width, height);
    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockAuth {
    pub fail_with: Option<BackendErrorKind>,
    pub roles: Vec<UserRole>,
    pub roles_fail: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockAuth {
    pub fn failing(kind: BackendErrorKind) -> Self {
        Self {
            fail_with: Some(kind),
            ..Self::default()
        }
    }

    fn record(&self, call: String) -> Result<(), BackendError> {
        self.calls.lock().expect("calls lock").push(call);
        match self.fail_with {
            Some(kind) => Err(BackendError::new(kind, "mock failure")),
            None => Ok(()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl AuthBackend for MockAuth {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<BackendSession, BackendError> {
        self.record(format!("sign_in:{email}"))?;
        Ok(BackendSession {
            access_token: "backend-token".into(),
            user: BackendUser {
                id: "user-1".into(),
                email: Some(email.to_string()),
            },
        })
    }

    async fn user_roles(&self, _session: &BackendSession) -> Result<Vec<UserRole>, BackendError> {
        if self.roles_fail {
            return Err(BackendError::new(BackendErrorKind::Unexpected, "roles down"));
        }
        Ok(self.roles.clone())
    }

    async fn sign_up(&self, account: &NewAccount) -> Result<(), BackendError> {
        self.record(format!("sign_up:{}", account.email))
    }

    async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), BackendError> {
        self.record(format!("reset:{email}:{redirect_to}"))
    }
}

pub enum GeneratorOutcome {
    Reply(Json),
    Status(u16, &'static str),
    Unreachable,
}

pub struct MockGenerator {
    pub outcome: GeneratorOutcome,
    pub calls: Mutex<Vec<Json>>,
}

impl MockGenerator {
    pub fn new(outcome: GeneratorOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Json> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl CertificateGenerator for MockGenerator {
    async fn generate(&self, payload: &Json) -> Result<Json, GeneratorError> {
        self.calls.lock().expect("calls lock").push(payload.clone());
        match &self.outcome {
            GeneratorOutcome::Reply(v) => Ok(v.clone()),
            GeneratorOutcome::Status(status, body) => Err(GeneratorError::Status {
                status: *status,
                body: body.to_string(),
            }),
            GeneratorOutcome::Unreachable => {
                Err(GeneratorError::Transport("connection refused".into()))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

pub fn test_config(web_dir: &str, environment: Environment) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            bind: "127.0.0.1".into(),
            port: 3000,
            request_timeout_secs: 30,
            max_body_bytes: 12 * 1024 * 1024,
        },
        paths: PathsConfig {
            web_dir: web_dir.into(),
        },
        auth: AuthConfig {
            jwt_secret: Some(TEST_SECRET.into()),
        },
        backend: BackendConfig {
            url: "http://127.0.0.1:1".into(),
            anon_key: "anon".into(),
        },
        certificate: CertificateConfig::default(),
        site: SiteConfig {
            environment,
            public_base_url: None,
        },
    }
}

pub fn test_state(auth: Arc<MockAuth>, generator: Arc<MockGenerator>) -> AppState {
    test_state_with(test_config("web", Environment::Development), auth, generator)
}

pub fn test_state_with(
    config: AppConfig,
    auth: Arc<MockAuth>,
    generator: Arc<MockGenerator>,
) -> AppState {
    AppState {
        config: LiveConfig::new(config),
        jwt_secret: Arc::from(TEST_SECRET),
        auth,
        generator,
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub const BOUNDARY: &str = "zertifikat-test-boundary";

/// A file part: field name, file name, MIME type, bytes.
pub type FilePart<'a> = (&'a str, &'a str, &'a str, &'a [u8]);

pub fn multipart_request(
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<FilePart<'_>>,
) -> Request<Full<Bytes>> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, file_name, mime, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Full::new(Bytes::from(body)))
        .expect("multipart request")
}

pub fn json_request(uri: &str, body: &str) -> Request<Full<Bytes>> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .expect("json request")
}

pub async fn body_json<B>(res: hyper::Response<B>) -> Json
where
    B: hyper::body::Body,
    B::Error: std::fmt::Debug,
{
    use http_body_util::BodyExt;
    let bytes = res.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
