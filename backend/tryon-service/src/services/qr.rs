/// QR codes that send kiosk customers to a salon's public try-on page
use crate::error::{Result, TryOnError};
use serde::Serialize;
use uuid::Uuid;

/// Rendered QR code and the URL it encodes
#[derive(Debug, Clone, Serialize)]
pub struct SalonQrCode {
    pub url: String,
    pub svg: String,
}

#[derive(Debug, Clone)]
pub struct SalonQrService {
    public_base_url: String,
}

impl SalonQrService {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self { public_base_url }
    }

    pub fn salon_url(&self, salon_id: Uuid) -> String {
        format!("{}/salon/{}", self.public_base_url, salon_id)
    }

    pub fn render(&self, salon_id: Uuid) -> Result<SalonQrCode> {
        let url = self.salon_url(salon_id);
        let code = qrcode::QrCode::new(url.as_bytes())
            .map_err(|e| TryOnError::Internal(format!("Failed to generate QR code: {e}")))?;

        let svg = code
            .render::<qrcode::render::svg::Color>()
            .min_dimensions(256, 256)
            .build();

        Ok(SalonQrCode { url, svg })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salon_url_trims_trailing_slash() {
        let service = SalonQrService::new("https://tryon.studio/");
        let id = Uuid::new_v4();
        assert_eq!(service.salon_url(id), format!("https://tryon.studio/salon/{id}"));
    }

    #[test]
    fn test_render_produces_svg() {
        let service = SalonQrService::new("https://tryon.studio");
        let qr = service.render(Uuid::new_v4()).unwrap();
        assert!(qr.svg.contains("<svg"));
        assert!(qr.url.starts_with("https://tryon.studio/salon/"));
    }
}
