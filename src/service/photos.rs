use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tokio::task::JoinSet;

use crate::db::{CommentRepository, LikeRepository, Photo, PhotoRepository, PhotoTagRepository, TagRepository, UserRepository};
use crate::error::AppError;
use crate::media::MediaStore;
use crate::service::{or_default, with_deadline};

/// A photo together with its live counts, tags and owner name.
#[derive(Debug, Clone, Serialize)]
pub struct PhotoResponse {
    pub id: String,
    pub caption: String,
    pub photo_url: String,
    pub photo_tags: Vec<String>,
    pub total_likes: i64,
    pub total_comments: i64,
    pub user_id: i64,
    pub username: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Default)]
struct Aggregate {
    photo_tags: Vec<String>,
    total_likes: i64,
    total_comments: i64,
    username: String,
}

impl PhotoResponse {
    fn compose(photo: Photo, parts: Aggregate) -> Self {
        Self {
            id: photo.id,
            caption: photo.caption,
            photo_url: photo.photo_url,
            photo_tags: parts.photo_tags,
            total_likes: parts.total_likes,
            total_comments: parts.total_comments,
            user_id: photo.user_id,
            username: parts.username,
            created_at: photo.created_at,
            updated_at: photo.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PhotoService {
    db: Pool<Sqlite>,
    media: Arc<dyn MediaStore>,
    deadline: Duration,
}

impl PhotoService {
    pub fn new(db: Pool<Sqlite>, media: Arc<dyn MediaStore>, deadline: Duration) -> Self {
        Self { db, media, deadline }
    }

    /// Persist a photo pointing at an already uploaded URL and attach its tags.
    pub async fn create(
        &self,
        user_id: i64,
        caption: &str,
        photo_url: &str,
        tags: &[String],
    ) -> Result<PhotoResponse, AppError> {
        with_deadline(self.deadline, async {
            let photo = PhotoRepository::create(&self.db, caption, photo_url, user_id).await?;

            let (owner, attached) = tokio::join!(
                UserRepository::find_by_id(&self.db, user_id),
                attach_tags(&self.db, &photo.id, tags),
            );
            let photo_tags = attached?;
            let username = or_default(owner.map(|u| u.username), "username", &photo.id);

            tracing::info!(photo_id = %photo.id, user_id, tags = photo_tags.len(), "photo created");

            Ok(PhotoResponse::compose(
                photo,
                Aggregate {
                    photo_tags,
                    username,
                    ..Aggregate::default()
                },
            ))
        })
        .await
    }

    pub async fn get(&self, id: &str) -> Result<PhotoResponse, AppError> {
        with_deadline(self.deadline, async {
            let photo = PhotoRepository::find_by_id(&self.db, id).await?;
            Ok(self.aggregate(photo).await)
        })
        .await
    }

    pub async fn list(&self) -> Result<Vec<PhotoResponse>, AppError> {
        with_deadline(self.deadline, async {
            let photos = PhotoRepository::find_all(&self.db).await?;
            Ok(self.aggregate_all(photos).await)
        })
        .await
    }

    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<PhotoResponse>, AppError> {
        with_deadline(self.deadline, async {
            let photos = PhotoRepository::find_by_user(&self.db, user_id).await?;
            Ok(self.aggregate_all(photos).await)
        })
        .await
    }

    /// Replace caption and the whole tag set. The lookup is scoped to the owner.
    pub async fn update(
        &self,
        id: &str,
        user_id: i64,
        caption: &str,
        tags: &[String],
    ) -> Result<PhotoResponse, AppError> {
        with_deadline(self.deadline, async {
            PhotoRepository::find_by_id_and_user(&self.db, id, user_id).await?;

            let photo = PhotoRepository::update_caption(&self.db, id, caption).await?;
            PhotoTagRepository::delete_for_photo(&self.db, id).await?;
            attach_tags(&self.db, id, tags).await?;

            tracing::info!(photo_id = %id, user_id, "photo updated");
            Ok(self.aggregate(photo).await)
        })
        .await
    }

    /// Delete the photo and its tag links, then its media on a best-effort basis.
    pub async fn delete(&self, id: &str, user_id: i64) -> Result<(), AppError> {
        with_deadline(self.deadline, async {
            let photo = PhotoRepository::find_by_id_and_user(&self.db, id, user_id).await?;

            PhotoTagRepository::delete_for_photo(&self.db, id).await?;
            PhotoRepository::delete(&self.db, id).await?;

            if let Err(e) = self.media.remove(&photo.photo_url, user_id).await {
                tracing::warn!(photo_id = %id, url = %photo.photo_url, error = %e, "failed to remove media");
            }

            tracing::info!(photo_id = %id, user_id, "photo deleted");
            Ok(())
        })
        .await
    }

    /// Fan out the per-photo lookups and join them. Each failed lookup
    /// degrades to its zero value.
    pub(crate) async fn aggregate(&self, photo: Photo) -> PhotoResponse {
        let (comments, likes, tags, owner) = tokio::join!(
            CommentRepository::count_by_photo(&self.db, &photo.id),
            LikeRepository::count_by_photo(&self.db, &photo.id),
            PhotoTagRepository::tag_names_for_photo(&self.db, &photo.id),
            UserRepository::find_by_id(&self.db, photo.user_id),
        );

        let parts = Aggregate {
            total_comments: or_default(comments, "total_comments", &photo.id),
            total_likes: or_default(likes, "total_likes", &photo.id),
            photo_tags: or_default(tags, "photo_tags", &photo.id),
            username: or_default(owner.map(|u| u.username), "username", &photo.id),
        };

        PhotoResponse::compose(photo, parts)
    }

    /// Aggregate every photo concurrently, keeping the input order.
    pub(crate) async fn aggregate_all(&self, photos: Vec<Photo>) -> Vec<PhotoResponse> {
        let mut tasks = JoinSet::new();
        for (index, photo) in photos.into_iter().enumerate() {
            let service = self.clone();
            tasks.spawn(async move { (index, service.aggregate(photo).await) });
        }

        let mut indexed = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(pair) => indexed.push(pair),
                Err(e) => tracing::error!(error = %e, "photo aggregate task failed"),
            }
        }

        indexed.sort_unstable_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, response)| response).collect()
    }
}

/// Find-or-create each tag and link it. Not transactional: the first failure
/// stops the loop and leaves earlier links in place.
async fn attach_tags(db: &Pool<Sqlite>, photo_id: &str, tags: &[String]) -> Result<Vec<String>, AppError> {
    let mut attached = Vec::with_capacity(tags.len());

    for name in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        let tag = TagRepository::find_or_create(db, name).await?;
        PhotoTagRepository::add(db, photo_id, tag.id).await?;

        if !attached.contains(&tag.name) {
            attached.push(tag.name);
        }
    }

    Ok(attached)
}
