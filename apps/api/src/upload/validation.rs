use axum::extract::Multipart;
use bytes::{Bytes, BytesMut};
use thiserror::Error;

/// The single multipart field the upload contract accepts.
pub const UPLOAD_FIELD: &str = "resume";

/// Rejection kinds for an incoming upload. The Display strings are the
/// exact client-facing messages of the HTTP contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No file uploaded")]
    NoFile,

    #[error("Only PDF files are allowed")]
    WrongType,

    #[error("File size is too large. Maximum size is 5MB.")]
    TooLarge,
}

/// An upload that passed validation. Nothing has touched disk yet.
#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    /// Client-supplied filename. Untrusted; sanitized again at storage.
    pub original_name: String,
    pub data: Bytes,
}

/// Scans the multipart stream for the `resume` field and validates it.
///
/// The declared content type is checked before a single body byte is read,
/// so a wrong-type upload causes no buffering and no storage side effects.
/// The size ceiling is enforced while streaming: the read stops the moment
/// the cap is crossed. A stream with no usable `resume` field (including a
/// malformed one) classifies as `NoFile`.
pub async fn extract_resume(
    multipart: &mut Multipart,
    allowed_content_type: &str,
    max_bytes: usize,
) -> Result<ValidatedUpload, ValidationError> {
    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) | Err(_) => return Err(ValidationError::NoFile),
        };

        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        if field.content_type() != Some(allowed_content_type) {
            return Err(ValidationError::WrongType);
        }

        let original_name = field.file_name().unwrap_or("resume.pdf").to_string();

        let mut data = BytesMut::new();
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if data.len() + chunk.len() > max_bytes {
                        return Err(ValidationError::TooLarge);
                    }
                    data.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                // The transport body limit tripped mid-read.
                Err(_) => return Err(ValidationError::TooLarge),
            }
        }

        return Ok(ValidatedUpload {
            original_name,
            data: data.freeze(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    const BOUNDARY: &str = "test-boundary";
    const PDF_TYPE: &str = "application/pdf";

    fn multipart_request(parts: &[(&str, &str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, filename, content_type, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n")
                    .as_bytes(),
            );
            if let Some(ct) = content_type {
                body.extend_from_slice(format!("Content-Type: {ct}\r\n").as_bytes());
            }
            body.extend_from_slice(b"\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn extract(req: Request<Body>, max_bytes: usize) -> Result<ValidatedUpload, ValidationError> {
        let mut multipart = Multipart::from_request(req, &()).await.unwrap();
        extract_resume(&mut multipart, PDF_TYPE, max_bytes).await
    }

    #[tokio::test]
    async fn test_accepts_single_pdf_field() {
        let req = multipart_request(&[("resume", "cv.pdf", Some(PDF_TYPE), b"%PDF-1.4 fake")]);
        let upload = extract(req, 1024).await.unwrap();
        assert_eq!(upload.original_name, "cv.pdf");
        assert_eq!(&upload.data[..], b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn test_missing_resume_field_is_no_file() {
        let req = multipart_request(&[("avatar", "me.png", Some("image/png"), b"png")]);
        assert_eq!(extract(req, 1024).await.unwrap_err(), ValidationError::NoFile);
    }

    #[tokio::test]
    async fn test_empty_form_is_no_file() {
        let req = multipart_request(&[]);
        assert_eq!(extract(req, 1024).await.unwrap_err(), ValidationError::NoFile);
    }

    #[tokio::test]
    async fn test_wrong_content_type_rejected() {
        let req = multipart_request(&[("resume", "cv.docx", Some("application/msword"), b"doc")]);
        assert_eq!(
            extract(req, 1024).await.unwrap_err(),
            ValidationError::WrongType
        );
    }

    #[tokio::test]
    async fn test_missing_content_type_rejected() {
        let req = multipart_request(&[("resume", "cv.pdf", None, b"%PDF")]);
        assert_eq!(
            extract(req, 1024).await.unwrap_err(),
            ValidationError::WrongType
        );
    }

    #[tokio::test]
    async fn test_oversize_rejected() {
        let req = multipart_request(&[("resume", "cv.pdf", Some(PDF_TYPE), &[0u8; 64])]);
        assert_eq!(extract(req, 16).await.unwrap_err(), ValidationError::TooLarge);
    }

    #[tokio::test]
    async fn test_exactly_at_ceiling_accepted() {
        let req = multipart_request(&[("resume", "cv.pdf", Some(PDF_TYPE), &[0u8; 16])]);
        assert!(extract(req, 16).await.is_ok());
    }

    #[tokio::test]
    async fn test_first_resume_field_wins() {
        let req = multipart_request(&[
            ("resume", "first.pdf", Some(PDF_TYPE), b"first"),
            ("resume", "second.pdf", Some(PDF_TYPE), b"second"),
        ]);
        let upload = extract(req, 1024).await.unwrap();
        assert_eq!(upload.original_name, "first.pdf");
    }

    #[test]
    fn test_messages_match_contract() {
        assert_eq!(ValidationError::NoFile.to_string(), "No file uploaded");
        assert_eq!(
            ValidationError::WrongType.to_string(),
            "Only PDF files are allowed"
        );
        assert_eq!(
            ValidationError::TooLarge.to_string(),
            "File size is too large. Maximum size is 5MB."
        );
    }
}
