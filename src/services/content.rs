use crate::{
    config::AppConfig,
    entities::{content, faq, hostel_image},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict}, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

pub const HERO_CATEGORY: &str = "hero";
const IMAGE_SIZES: [&str; 4] = ["sm", "md", "lg", "xl"];

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FaqInput {
    pub question: String,
    pub question_es: Option<String>,
    pub answer: String,
    pub answer_es: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FaqPatch {
    pub question: Option<String>,
    pub question_es: Option<String>,
    pub answer: Option<String>,
    pub answer_es: Option<String>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DisplayOrderUpdate {
    pub id: Uuid,
    pub display_order: i32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ContentUpsert {
    pub section: String,
    pub key: String,
    pub value_en: Option<String>,
    pub value_es: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ContentPatch {
    pub value_en: Option<String>,
    pub value_es: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ImageInput {
    pub image_url: String,
    pub alt_text: Option<String>,
    pub alt_text_es: Option<String>,
    pub category: String,
    pub display_order: Option<i32>,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub size: Option<String>,
    pub rotation: Option<i32>,
    pub show_on_mobile: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ImagePatch {
    pub image_url: Option<String>,
    pub alt_text: Option<String>,
    pub alt_text_es: Option<String>,
    pub category: Option<String>,
    pub display_order: Option<i32>,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub size: Option<String>,
    pub rotation: Option<i32>,
    pub show_on_mobile: Option<bool>,
}

/// One row of a batch image update. Only ordering, category and alt texts change.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ImageBatchItem {
    pub id: Uuid,
    pub display_order: Option<i32>,
    pub category: Option<String>,
    pub alt_text: Option<String>,
    pub alt_text_es: Option<String>,
}

/// Floating hero image as rendered by the landing page.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HeroImage {
    pub id: String,
    pub image_url: String,
    pub alt_text: Option<String>,
    pub alt_text_es: Option<String>,
    pub display_order: i32,
    pub position_x: Option<i32>,
    pub position_y: Option<i32>,
    pub size: Option<String>,
    pub rotation: Option<i32>,
    pub show_on_mobile: bool,
}

impl From<hostel_image::Model> for HeroImage {
    fn from(image: hostel_image::Model) -> Self {
        Self {
            id: image.id.to_string(),
            image_url: image.image_url,
            alt_text: image.alt_text,
            alt_text_es: image.alt_text_es,
            display_order: image.display_order,
            position_x: image.position_x,
            position_y: image.position_y,
            size: image.size,
            rotation: image.rotation,
            show_on_mobile: image.show_on_mobile,
        }
    }
}

/// (file, alt text, x, y, size, rotation, show on mobile)
const DEFAULT_HEROES: [(&str, &str, i32, i32, &str, i32, bool); 10] = [
    ("mandioca-main-1.webp", "Hostel entrance", 8, 22, "lg", -6, true),
    ("mandioca-main-2.webp", "Pool area", 12, 55, "xl", 4, false),
    ("mandioca-living-1.webp", "Living space", 6, 82, "lg", -3, false),
    ("mandioca-main-4.webp", "Garden view", 88, 18, "xl", 5, true),
    ("mandioca-private-1.webp", "Private room", 92, 52, "lg", -4, false),
    ("mandioca-main-5.webp", "Exterior", 86, 80, "lg", 6, false),
    ("mandioca-main-3.webp", "Common area", 25, 32, "md", 8, false),
    ("mandioca-dorm-1.webp", "Dorm room", 75, 30, "md", -7, false),
    ("mandioca-main-6.webp", "Hostel view", 28, 72, "md", -5, true),
    ("mandioca-living-2.webp", "Lounge", 72, 74, "md", 6, true),
];

/// Built-in hero set served when the table is empty or unreachable.
pub fn default_hero_images() -> Vec<HeroImage> {
    DEFAULT_HEROES
        .iter()
        .enumerate()
        .map(|(i, (file, alt, x, y, size, rotation, mobile))| HeroImage {
            id: (i + 1).to_string(),
            image_url: format!("/assets/images/{}", file),
            alt_text: Some((*alt).to_string()),
            alt_text_es: None,
            display_order: i as i32 + 1,
            position_x: Some(*x),
            position_y: Some(*y),
            size: Some((*size).to_string()),
            rotation: Some(*rotation),
            show_on_mobile: *mobile,
        })
        .collect()
}

fn required(field: &str, value: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "Missing required field: {}",
            field
        )));
    }
    Ok(value.to_string())
}

fn check_size(size: Option<&str>) -> Result<(), ServiceError> {
    match size {
        Some(s) if !IMAGE_SIZES.contains(&s) => Err(ServiceError::ValidationError(format!(
            "size must be one of {}",
            IMAGE_SIZES.join(", ")
        ))),
        _ => Ok(()),
    }
}

/// FAQ, content blocks and images for the public site and the admin console.
#[derive(Clone)]
pub struct ContentService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl ContentService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    fn hostel_id(&self) -> Uuid {
        self.config.hostel_id
    }

    // FAQ

    #[instrument(skip(self))]
    pub async fn list_faq(&self, active_only: bool) -> Result<Vec<faq::Model>, ServiceError> {
        let mut query = faq::Entity::find().filter(faq::Column::HostelId.eq(self.hostel_id()));
        if active_only {
            query = query.filter(faq::Column::IsActive.eq(true));
        }
        Ok(query
            .order_by_asc(faq::Column::DisplayOrder)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create_faq(
        &self,
        input: FaqInput,
        now: DateTime<Utc>,
    ) -> Result<faq::Model, ServiceError> {
        let entry = faq::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(self.hostel_id()),
            question: Set(required("question", &input.question)?),
            question_es: Set(input.question_es),
            answer: Set(required("answer", &input.answer)?),
            answer_es: Set(input.answer_es),
            display_order: Set(input.display_order.unwrap_or(0)),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;
        Ok(entry)
    }

    async fn find_faq(&self, id: Uuid) -> Result<faq::Model, ServiceError> {
        faq::Entity::find_by_id(id)
            .filter(faq::Column::HostelId.eq(self.hostel_id()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("FAQ entry not found".to_string()))
    }

    #[instrument(skip(self, patch))]
    pub async fn update_faq(
        &self,
        id: Uuid,
        patch: FaqPatch,
        now: DateTime<Utc>,
    ) -> Result<faq::Model, ServiceError> {
        let mut entry: faq::ActiveModel = self.find_faq(id).await?.into();
        if let Some(question) = patch.question {
            entry.question = Set(required("question", &question)?);
        }
        if let Some(answer) = patch.answer {
            entry.answer = Set(required("answer", &answer)?);
        }
        if patch.question_es.is_some() {
            entry.question_es = Set(patch.question_es);
        }
        if patch.answer_es.is_some() {
            entry.answer_es = Set(patch.answer_es);
        }
        if let Some(order) = patch.display_order {
            entry.display_order = Set(order);
        }
        if let Some(active) = patch.is_active {
            entry.is_active = Set(active);
        }
        entry.updated_at = Set(now);
        Ok(entry.update(&*self.db).await?)
    }

    /// Applies every new position or none of them.
    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn reorder_faq(
        &self,
        items: Vec<DisplayOrderUpdate>,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        for item in items {
            let result = faq::Entity::update_many()
                .col_expr(faq::Column::DisplayOrder, Expr::value(item.display_order))
                .col_expr(faq::Column::UpdatedAt, Expr::value(now))
                .filter(faq::Column::Id.eq(item.id))
                .filter(faq::Column::HostelId.eq(self.hostel_id()))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                return Err(ServiceError::NotFound(format!(
                    "FAQ entry {} not found",
                    item.id
                )));
            }
        }
        txn.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_faq(&self, id: Uuid) -> Result<(), ServiceError> {
        let entry = self.find_faq(id).await?;
        faq::Entity::delete_by_id(entry.id).exec(&*self.db).await?;
        Ok(())
    }

    // Content blocks

    #[instrument(skip(self))]
    pub async fn list_content(
        &self,
        section: Option<&str>,
    ) -> Result<Vec<content::Model>, ServiceError> {
        let mut query =
            content::Entity::find().filter(content::Column::HostelId.eq(self.hostel_id()));
        if let Some(section) = section.filter(|s| !s.is_empty()) {
            query = query.filter(content::Column::Section.eq(section));
        }
        Ok(query
            .order_by_asc(content::Column::Section)
            .order_by_asc(content::Column::Key)
            .all(&*self.db)
            .await?)
    }

    /// Inserts or replaces the block addressed by (section, key).
    #[instrument(skip(self, input), fields(section = %input.section, key = %input.key))]
    pub async fn upsert_content(
        &self,
        input: ContentUpsert,
        now: DateTime<Utc>,
    ) -> Result<content::Model, ServiceError> {
        let section = required("section", &input.section)?;
        let key = required("key", &input.key)?;

        let block = content::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(self.hostel_id()),
            section: Set(section.clone()),
            key: Set(key.clone()),
            value_en: Set(input.value_en),
            value_es: Set(input.value_es),
            updated_at: Set(now),
        };

        content::Entity::insert(block)
            .on_conflict(
                OnConflict::columns([
                    content::Column::HostelId,
                    content::Column::Section,
                    content::Column::Key,
                ])
                .update_columns([
                    content::Column::ValueEn,
                    content::Column::ValueEs,
                    content::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;

        content::Entity::find()
            .filter(content::Column::HostelId.eq(self.hostel_id()))
            .filter(content::Column::Section.eq(section))
            .filter(content::Column::Key.eq(key))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::InternalError("Upserted content not found".to_string()))
    }

    async fn find_content(&self, id: Uuid) -> Result<content::Model, ServiceError> {
        content::Entity::find_by_id(id)
            .filter(content::Column::HostelId.eq(self.hostel_id()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Content not found".to_string()))
    }

    #[instrument(skip(self, patch))]
    pub async fn update_content(
        &self,
        id: Uuid,
        patch: ContentPatch,
        now: DateTime<Utc>,
    ) -> Result<content::Model, ServiceError> {
        let mut block: content::ActiveModel = self.find_content(id).await?.into();
        if patch.value_en.is_some() {
            block.value_en = Set(patch.value_en);
        }
        if patch.value_es.is_some() {
            block.value_es = Set(patch.value_es);
        }
        block.updated_at = Set(now);
        Ok(block.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_content(&self, id: Uuid) -> Result<(), ServiceError> {
        let block = self.find_content(id).await?;
        content::Entity::delete_by_id(block.id).exec(&*self.db).await?;
        Ok(())
    }

    // Images

    /// `category = "all"` (or none) lists every image.
    #[instrument(skip(self))]
    pub async fn list_images(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<hostel_image::Model>, ServiceError> {
        let mut query = hostel_image::Entity::find()
            .filter(hostel_image::Column::HostelId.eq(self.hostel_id()));
        if let Some(category) = category.filter(|c| !c.is_empty() && *c != "all") {
            query = query.filter(hostel_image::Column::Category.eq(category));
        }
        Ok(query
            .order_by_asc(hostel_image::Column::DisplayOrder)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input), fields(category = %input.category))]
    pub async fn create_image(
        &self,
        input: ImageInput,
        now: DateTime<Utc>,
    ) -> Result<hostel_image::Model, ServiceError> {
        check_size(input.size.as_deref())?;
        let image = hostel_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            hostel_id: Set(self.hostel_id()),
            image_url: Set(required("image_url", &input.image_url)?),
            alt_text: Set(input.alt_text),
            alt_text_es: Set(input.alt_text_es),
            category: Set(required("category", &input.category)?),
            display_order: Set(input.display_order.unwrap_or(0)),
            position_x: Set(input.position_x),
            position_y: Set(input.position_y),
            size: Set(input.size),
            rotation: Set(input.rotation),
            show_on_mobile: Set(input.show_on_mobile.unwrap_or(true)),
            created_at: Set(now),
        }
        .insert(&*self.db)
        .await?;
        info!(image_id = %image.id, "Image created");
        Ok(image)
    }

    async fn find_image(&self, id: Uuid) -> Result<hostel_image::Model, ServiceError> {
        hostel_image::Entity::find_by_id(id)
            .filter(hostel_image::Column::HostelId.eq(self.hostel_id()))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Image not found".to_string()))
    }

    #[instrument(skip(self, patch))]
    pub async fn update_image(
        &self,
        id: Uuid,
        patch: ImagePatch,
    ) -> Result<hostel_image::Model, ServiceError> {
        check_size(patch.size.as_deref())?;
        let mut image: hostel_image::ActiveModel = self.find_image(id).await?.into();
        if let Some(url) = patch.image_url {
            image.image_url = Set(required("image_url", &url)?);
        }
        if let Some(category) = patch.category {
            image.category = Set(required("category", &category)?);
        }
        if patch.alt_text.is_some() {
            image.alt_text = Set(patch.alt_text);
        }
        if patch.alt_text_es.is_some() {
            image.alt_text_es = Set(patch.alt_text_es);
        }
        if let Some(order) = patch.display_order {
            image.display_order = Set(order);
        }
        if patch.position_x.is_some() {
            image.position_x = Set(patch.position_x);
        }
        if patch.position_y.is_some() {
            image.position_y = Set(patch.position_y);
        }
        if patch.size.is_some() {
            image.size = Set(patch.size);
        }
        if patch.rotation.is_some() {
            image.rotation = Set(patch.rotation);
        }
        if let Some(mobile) = patch.show_on_mobile {
            image.show_on_mobile = Set(mobile);
        }
        Ok(image.update(&*self.db).await?)
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn batch_update_images(&self, items: Vec<ImageBatchItem>) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        for item in items {
            let Some(existing) = hostel_image::Entity::find_by_id(item.id)
                .filter(hostel_image::Column::HostelId.eq(self.hostel_id()))
                .one(&txn)
                .await?
            else {
                return Err(ServiceError::NotFound(format!("Image {} not found", item.id)));
            };
            let mut image: hostel_image::ActiveModel = existing.into();
            if let Some(order) = item.display_order {
                image.display_order = Set(order);
            }
            if let Some(category) = item.category {
                image.category = Set(required("category", &category)?);
            }
            if item.alt_text.is_some() {
                image.alt_text = Set(item.alt_text);
            }
            if item.alt_text_es.is_some() {
                image.alt_text_es = Set(item.alt_text_es);
            }
            image.update(&txn).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_image(&self, id: Uuid) -> Result<(), ServiceError> {
        let image = self.find_image(id).await?;
        hostel_image::Entity::delete_by_id(image.id)
            .exec(&*self.db)
            .await?;
        Ok(())
    }

    /// Never fails; falls back to the built-in set.
    #[instrument(skip(self))]
    pub async fn hero_images(&self) -> Vec<HeroImage> {
        match self.list_images(Some(HERO_CATEGORY)).await {
            Ok(images) if !images.is_empty() => images.into_iter().map(HeroImage::from).collect(),
            Ok(_) => default_hero_images(),
            Err(e) => {
                warn!("Hero image query failed, serving defaults: {}", e);
                default_hero_images()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seeded_db, test_config};
    use assert_matches::assert_matches;

    async fn service() -> ContentService {
        let config = Arc::new(test_config());
        let db = seeded_db(&config).await;
        ContentService::new(db, config)
    }

    fn faq_input(question: &str, order: i32) -> FaqInput {
        FaqInput {
            question: question.into(),
            question_es: None,
            answer: "Yes".into(),
            answer_es: Some("Sí".into()),
            display_order: Some(order),
            is_active: None,
        }
    }

    #[test]
    fn default_heroes_are_ordered() {
        let heroes = default_hero_images();
        assert_eq!(heroes.len(), 10);
        assert_eq!(heroes[0].id, "1");
        assert_eq!(heroes[0].image_url, "/assets/images/mandioca-main-1.webp");
        assert!(heroes.windows(2).all(|w| w[0].display_order < w[1].display_order));
    }

    #[tokio::test]
    async fn faq_reorder_is_all_or_nothing() {
        let svc = service().await;
        let now = Utc::now();
        let a = svc.create_faq(faq_input("Breakfast?", 1), now).await.unwrap();
        let b = svc.create_faq(faq_input("Parking?", 2), now).await.unwrap();

        svc.reorder_faq(
            vec![
                DisplayOrderUpdate { id: a.id, display_order: 2 },
                DisplayOrderUpdate { id: b.id, display_order: 1 },
            ],
            now,
        )
        .await
        .unwrap();
        let listed = svc.list_faq(false).await.unwrap();
        assert_eq!(listed[0].id, b.id);

        let result = svc
            .reorder_faq(
                vec![
                    DisplayOrderUpdate { id: a.id, display_order: 0 },
                    DisplayOrderUpdate { id: Uuid::new_v4(), display_order: 5 },
                ],
                now,
            )
            .await;
        assert_matches!(result, Err(ServiceError::NotFound(_)));
        let listed = svc.list_faq(false).await.unwrap();
        assert_eq!(listed[0].id, b.id, "failed batch must roll back");
    }

    #[tokio::test]
    async fn inactive_faq_hidden_from_public_list() {
        let svc = service().await;
        let entry = svc.create_faq(faq_input("Pets?", 0), Utc::now()).await.unwrap();
        svc.update_faq(
            entry.id,
            FaqPatch {
                is_active: Some(false),
                ..Default::default()
            },
            Utc::now(),
        )
        .await
        .unwrap();
        assert!(svc.list_faq(true).await.unwrap().is_empty());
        assert_eq!(svc.list_faq(false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn content_upsert_replaces_existing_key() {
        let svc = service().await;
        let first = svc
            .upsert_content(
                ContentUpsert {
                    section: "hero".into(),
                    key: "title".into(),
                    value_en: Some("Welcome".into()),
                    value_es: None,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let second = svc
            .upsert_content(
                ContentUpsert {
                    section: "hero".into(),
                    key: "title".into(),
                    value_en: Some("Hello".into()),
                    value_es: Some("Hola".into()),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.value_es.as_deref(), Some("Hola"));
        assert_eq!(svc.list_content(Some("hero")).await.unwrap().len(), 1);
        assert!(svc.list_content(Some("about")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn hero_images_fall_back_until_one_exists() {
        let svc = service().await;
        assert_eq!(svc.hero_images().await, default_hero_images());

        svc.create_image(
            ImageInput {
                image_url: "https://cdn.example.com/pool.webp".into(),
                alt_text: Some("Pool".into()),
                alt_text_es: None,
                category: HERO_CATEGORY.into(),
                display_order: Some(1),
                position_x: Some(10),
                position_y: Some(20),
                size: Some("lg".into()),
                rotation: Some(3),
                show_on_mobile: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();

        let heroes = svc.hero_images().await;
        assert_eq!(heroes.len(), 1);
        assert_eq!(heroes[0].image_url, "https://cdn.example.com/pool.webp");
        assert_eq!(svc.list_images(Some("gallery")).await.unwrap().len(), 0);
        assert_eq!(svc.list_images(Some("all")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn image_size_is_validated() {
        let svc = service().await;
        let result = svc
            .create_image(
                ImageInput {
                    image_url: "/a.webp".into(),
                    alt_text: None,
                    alt_text_es: None,
                    category: "gallery".into(),
                    display_order: None,
                    position_x: None,
                    position_y: None,
                    size: Some("huge".into()),
                    rotation: None,
                    show_on_mobile: None,
                },
                Utc::now(),
            )
            .await;
        assert_matches!(result, Err(ServiceError::ValidationError(_)));
    }
}
