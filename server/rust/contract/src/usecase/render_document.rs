use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::document::{paginate, PdfRenderer, RenderedArtifact};
use crate::domain::entity::Party;
use crate::domain::error::ContractEngineError;
use crate::usecase::generate_document::{DocumentProfile, GenerateDocumentUseCase, GeneratedDocument};

/// RenderedContract は生成した本文と、そこから作った PDF。
#[derive(Debug, Clone)]
pub struct RenderedContract {
    pub document: GeneratedDocument,
    pub artifact: RenderedArtifact,
}

/// RenderDocumentUseCase は本文生成 → ページ分割 → PDF 化までを行う。保存や送信はしない。
pub struct RenderDocumentUseCase {
    generator: Arc<GenerateDocumentUseCase>,
    renderer: Arc<PdfRenderer>,
    profile: DocumentProfile,
}

impl RenderDocumentUseCase {
    pub fn new(
        generator: Arc<GenerateDocumentUseCase>,
        renderer: Arc<PdfRenderer>,
        profile: DocumentProfile,
    ) -> Self {
        Self {
            generator,
            renderer,
            profile,
        }
    }

    pub async fn execute(&self, party_id: &Uuid) -> Result<RenderedContract, ContractEngineError> {
        let document = self
            .generator
            .execute_on(party_id, Utc::now().date_naive())
            .await?;
        Ok(self.render_generated(document).await)
    }

    pub async fn render_for(
        &self,
        partner: Party,
        today: NaiveDate,
    ) -> Result<RenderedContract, ContractEngineError> {
        let document = self.generator.generate_for(partner, today).await?;
        Ok(self.render_generated(document).await)
    }

    async fn render_generated(&self, document: GeneratedDocument) -> RenderedContract {
        let layout = self.profile.layout_for(&document.partner);
        let pages = paginate(&document.text, &layout);
        tracing::debug!(
            party_id = %document.partner.id,
            pages = pages.page_count(),
            image_pages = pages.image_pages().count(),
            "contract paginated"
        );
        let artifact = self.renderer.render(&pages).await;
        RenderedContract { document, artifact }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::ContractTemplate;
    use crate::domain::repository::party_repository::MockPartyRepository;
    use crate::domain::repository::template_repository::MockTemplateRepository;
    use crate::domain::service::image_fetcher::MockImageFetcher;

    #[tokio::test]
    async fn test_render_document_produces_pdf() {
        let partner = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let party_id = partner.id;

        let mut templates = MockTemplateRepository::new();
        templates.expect_find_active().returning(|| {
            Ok(vec![ContractTemplate::new(
                "NCNDA",
                "1. OBJETO\n[NOME_COMPLETO] concorda. [ESPAÇO PARA IMAGEM DO PASSAPORTE_PARCEIRO]",
                true,
            )])
        });
        let mut parties = MockPartyRepository::new();
        parties
            .expect_find_by_id()
            .returning(move |_| Ok(Some(partner.clone())));
        parties
            .expect_find_administrator_with_image()
            .returning(|| Ok(None));
        let mut fetcher = MockImageFetcher::new();
        fetcher.expect_fetch().never();

        let uc = RenderDocumentUseCase::new(
            Arc::new(GenerateDocumentUseCase::new(
                Arc::new(templates),
                Arc::new(parties),
            )),
            Arc::new(PdfRenderer::new(Arc::new(fetcher))),
            DocumentProfile::default(),
        );
        let rendered = uc.execute(&party_id).await.unwrap();
        assert!(rendered.artifact.bytes.starts_with(b"%PDF-1.4"));
        assert_eq!(rendered.artifact.page_count, 1);
        assert!(rendered.document.text.contains("Ana Silva concorda."));
    }
}
