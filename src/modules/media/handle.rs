use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::{get, web, HttpResponse};
use futures_util::TryStreamExt;

use crate::api::error;
use crate::modules::media::{model::PhotoUpload, service::MediaService};

pub const PHOTO_FIELD: &str = "photo";

/// Multipart body carrying one `photo` file plus any plain text fields.
pub struct PhotoForm {
    pub photo: PhotoUpload,
    pub fields: HashMap<String, String>,
}

impl PhotoForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str).filter(|v| !v.trim().is_empty())
    }
}

pub async fn read_photo_form(
    mut payload: Multipart,
    max_file_size: usize,
) -> Result<PhotoForm, error::Error> {
    let mut photo = None;
    let mut fields = HashMap::new();

    while let Some(mut field) =
        payload.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let filename =
            field.content_disposition().and_then(|cd| cd.get_filename()).map(str::to_string);
        let mime_type = field.content_type().map(|m| m.essence_str().to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) =
            field.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
        {
            if bytes.len() + chunk.len() > max_file_size {
                return Err(error::Error::bad_request(format!(
                    "File size exceeds maximum allowed size of {max_file_size} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if name == PHOTO_FIELD {
            let filename = filename.ok_or_else(|| error::Error::bad_request("Missing filename"))?;
            photo = Some(PhotoUpload { filename, mime_type, bytes });
        } else if filename.is_none() {
            let value = String::from_utf8(bytes)
                .map_err(|_| error::Error::bad_request(format!("Field {name} must be text")))?;
            fields.insert(name, value);
        }
    }

    let photo = photo.ok_or_else(|| {
        error::Error::bad_request(format!("Missing or invalid {PHOTO_FIELD} file"))
    })?;

    Ok(PhotoForm { photo, fields })
}

#[get("/{category}/{file}")]
pub async fn serve_photo(
    media_service: web::Data<MediaService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, error::Error> {
    let (category, file) = path.into_inner();
    let full_path = media_service.resolve_path(&category, &file)?;

    let bytes = match tokio::fs::read(&full_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(error::Error::not_found("File not found"));
        }
        Err(e) => return Err(error::SystemError::from(e).into()),
    };

    let mime = mime_guess::from_path(&full_path).first_or_octet_stream();
    Ok(HttpResponse::Ok().content_type(mime.essence_str()).body(bytes))
}
