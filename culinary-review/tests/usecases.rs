//! Use-case behavior against a real database. Each test runs inside a
//! transaction that is rolled back, and is skipped without `TEST_DATABASE_URL`.

use culinary_review::error::AppError;
use culinary_review::models::User;
use culinary_review::usecases::{ProfileInput, RecipeInput, Registration, TagRefs};

mod common;

use common::*;

async fn register(app: &TestApp, name: &str) -> User {
    let username = unique(name);
    app.ctx
        .users
        .create_user(Registration {
            email: format!("{}@example.com", username),
            username,
            password: "secret1".to_owned(),
        })
        .await
        .unwrap()
}

fn pasta() -> RecipeInput {
    RecipeInput {
        title: "Pasta".to_owned(),
        description: "Weeknight pasta".to_owned(),
        ingredients: "noodles, tomatoes".to_owned(),
        instructions: "boil, toss".to_owned(),
    }
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let Some(app) = database_app() else { return };
    let user = register(&app, "dup").await;

    let same_email = app
        .ctx
        .users
        .create_user(Registration {
            username: unique("other"),
            email: user.email.to_uppercase(),
            password: "secret1".to_owned(),
        })
        .await;
    assert!(matches!(same_email, Err(AppError::Conflict(_))));

    let same_username = app
        .ctx
        .users
        .create_user(Registration {
            username: user.username.clone(),
            email: format!("{}@example.com", unique("other")),
            password: "secret1".to_owned(),
        })
        .await;
    assert!(matches!(same_username, Err(AppError::Conflict(_))));

    let found = app
        .ctx
        .users
        .get_user_by_email_or_username(user.email.clone())
        .await
        .unwrap();
    assert_eq!(found.id, user.id);
}

#[tokio::test]
async fn registration_creates_placeholder_profile() {
    let Some(app) = database_app() else { return };
    let user = register(&app, "profiled").await;
    let detail = app.ctx.users.get_user_by_id(user.id).await.unwrap();
    let profile = detail.profile.unwrap();
    assert_eq!(profile.full_name, user.username);
    assert_eq!(profile.avatar_url, "");
    assert!(detail.reviews.is_empty());
    assert!(detail.favorites.is_empty());
}

#[tokio::test]
async fn login_and_change_password() {
    let Some(app) = database_app() else { return };
    let user = register(&app, "login").await;
    let users = &app.ctx.users;

    let issued = users
        .login(user.username.clone(), "secret1".to_owned())
        .await
        .unwrap();
    assert_eq!(app.ctx.tokens.verify(&issued.token).unwrap(), user.id);
    assert!(users.login(user.email.clone(), "secret1".to_owned()).await.is_ok());
    assert!(matches!(
        users.login(user.username.clone(), "wrong-password".to_owned()).await,
        Err(AppError::Unauthorized(_))
    ));
    assert!(matches!(
        users.login(unique("ghost"), "secret1".to_owned()).await,
        Err(AppError::Unauthorized(_))
    ));

    assert!(matches!(
        users
            .change_password(user.id, "nope".to_owned(), "secret2".to_owned())
            .await,
        Err(AppError::Unauthorized(_))
    ));
    users
        .change_password(user.id, "secret1".to_owned(), "secret2".to_owned())
        .await
        .unwrap();
    assert!(users.login(user.username.clone(), "secret1".to_owned()).await.is_err());
    assert!(users.login(user.username.clone(), "secret2".to_owned()).await.is_ok());
}

#[tokio::test]
async fn login_accepts_email_in_any_case() {
    let Some(app) = database_app() else { return };
    let users = &app.ctx.users;
    let username = unique("Mixy");
    let typed_email = format!("{}@Example.com", username);
    let user = users
        .create_user(Registration {
            username: username.clone(),
            email: typed_email.clone(),
            password: "secret1".to_owned(),
        })
        .await
        .unwrap();
    assert_eq!(user.email, typed_email.to_ascii_lowercase());

    assert!(users.login(typed_email.clone(), "secret1".to_owned()).await.is_ok());
    assert!(users
        .login(format!(" {} ", typed_email.to_uppercase()), "secret1".to_owned())
        .await
        .is_ok());
    assert_eq!(
        users.get_user_by_email_or_username(typed_email).await.unwrap().id,
        user.id
    );
    assert!(matches!(
        users.login(username.to_lowercase(), "secret1".to_owned()).await,
        Err(AppError::Unauthorized(_))
    ));
}

#[tokio::test]
async fn profile_lifecycle_replaces_avatar() {
    let Some(app) = database_app() else { return };
    let user = register(&app, "avatar").await;
    let profiles = &app.ctx.profiles;
    let input = || ProfileInput {
        full_name: "Chef Test".to_owned(),
        bio: "Cooks things".to_owned(),
    };

    let created = profiles
        .create_profile(user.id, input(), png("me.png"))
        .await
        .unwrap();
    assert!(created.avatar_url.starts_with(MEDIA_URL));
    assert_eq!(app.stored_files(), 1);

    let again = profiles.create_profile(user.id, input(), png("me.png")).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(app.stored_files(), 1);

    let updated = profiles
        .update_profile_by_user_id(user.id, input(), png("new.png"))
        .await
        .unwrap();
    assert_ne!(updated.avatar_url, created.avatar_url);
    assert_eq!(app.stored_files(), 1);
    assert_eq!(
        profiles.get_profile_by_user_id(user.id).await.unwrap().avatar_url,
        updated.avatar_url
    );
}

#[tokio::test]
async fn recipe_tags_match_submission_exactly() {
    let Some(app) = database_app() else { return };
    let owner = register(&app, "chef").await;
    let italian = app.ctx.tags.create_tag(unique("italian")).await.unwrap();
    let quick = app.ctx.tags.create_tag(unique("quick")).await.unwrap();
    let vegan = app.ctx.tags.create_tag(unique("vegan")).await.unwrap();

    let recipe = app
        .ctx
        .recipes
        .create_recipe(
            owner.id,
            pasta(),
            TagRefs {
                ids: vec![quick.id, quick.id],
                names: vec![italian.name.clone()],
            },
            vec![png("pasta.png")],
        )
        .await
        .unwrap();
    let mut tag_ids = recipe.tags.iter().map(|t| t.id).collect::<Vec<_>>();
    tag_ids.sort_unstable();
    let mut expected = vec![italian.id, quick.id];
    expected.sort_unstable();
    assert_eq!(tag_ids, expected);
    assert_eq!(recipe.images.len(), 1);

    let updated = app
        .ctx
        .recipes
        .update_recipe(
            owner.id,
            recipe.recipe.id,
            pasta(),
            TagRefs {
                ids: vec![vegan.id],
                names: vec![],
            },
            vec![png("a.png"), png("b.png")],
        )
        .await
        .unwrap();
    assert_eq!(updated.tags.iter().map(|t| t.id).collect::<Vec<_>>(), vec![vegan.id]);
    assert_eq!(updated.images.len(), 2);
    assert!(updated
        .images
        .iter()
        .all(|image| !recipe.images.iter().any(|old| old.url == image.url)));
    assert_eq!(app.stored_files(), 2);
}

#[tokio::test]
async fn unknown_tag_aborts_recipe_creation() {
    let Some(app) = database_app() else { return };
    let owner = register(&app, "chef").await;
    let before = app.ctx.recipes.get_all_recipes().await.unwrap().len();

    let err = app
        .ctx
        .recipes
        .create_recipe(
            owner.id,
            pasta(),
            TagRefs {
                ids: vec![i64::MAX],
                names: vec![],
            },
            vec![png("pasta.png")],
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("tag with ID {} does not exist", i64::MAX)
    );
    assert_eq!(app.ctx.recipes.get_all_recipes().await.unwrap().len(), before);
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn only_the_owner_changes_a_recipe() {
    let Some(app) = database_app() else { return };
    let owner = register(&app, "owner").await;
    let other = register(&app, "other").await;
    let recipe = app
        .ctx
        .recipes
        .create_recipe(owner.id, pasta(), TagRefs::default(), vec![])
        .await
        .unwrap();

    let mut changed = pasta();
    changed.title = "Stolen".to_owned();
    let err = app
        .ctx
        .recipes
        .update_recipe(other.id, recipe.recipe.id, changed, TagRefs::default(), vec![png("x.png")])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
    assert_eq!(app.stored_files(), 0);
    assert!(matches!(
        app.ctx.recipes.delete_recipe(other.id, recipe.recipe.id).await,
        Err(AppError::Unauthorized(_))
    ));
    let unchanged = app.ctx.recipes.get_recipe_by_id(recipe.recipe.id).await.unwrap();
    assert_eq!(unchanged.recipe.title, "Pasta");
}

#[tokio::test]
async fn deleting_a_recipe_removes_its_children() {
    let Some(app) = database_app() else { return };
    let owner = register(&app, "owner").await;
    let fan = register(&app, "fan").await;
    let tag = app.ctx.tags.create_tag(unique("soup")).await.unwrap();
    let recipe = app
        .ctx
        .recipes
        .create_recipe(
            owner.id,
            pasta(),
            TagRefs {
                ids: vec![tag.id],
                names: vec![],
            },
            vec![png("soup.png")],
        )
        .await
        .unwrap();
    let id = recipe.recipe.id;
    let review = app
        .ctx
        .reviews
        .create_review(fan.id, id, "Lovely".to_owned())
        .await
        .unwrap();
    app.ctx.favorites.create_favorite(fan.id, id).await.unwrap();

    app.ctx.recipes.delete_recipe(owner.id, id).await.unwrap();

    assert!(matches!(
        app.ctx.recipes.get_recipe_by_id(id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        app.ctx.reviews.get_review_by_id(review.review.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(app.ctx.favorites.get_by_user_id(fan.id).await.unwrap().is_empty());
    assert_eq!(app.stored_files(), 0);
    assert!(matches!(
        app.ctx.recipes.delete_recipe(owner.id, id).await,
        Err(AppError::NotFound(_))
    ));
    // The tag itself survives.
    assert_eq!(
        app.ctx.tags.get_tags_by_names(vec![tag.name.clone()]).await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn only_the_author_changes_a_review() {
    let Some(app) = database_app() else { return };
    let owner = register(&app, "owner").await;
    let author = register(&app, "author").await;
    let other = register(&app, "other").await;
    let recipe = app
        .ctx
        .recipes
        .create_recipe(owner.id, pasta(), TagRefs::default(), vec![])
        .await
        .unwrap();
    let review = app
        .ctx
        .reviews
        .create_review(author.id, recipe.recipe.id, "Tasty".to_owned())
        .await
        .unwrap();
    assert_eq!(review.user.username, author.username);

    let reviews = &app.ctx.reviews;
    let err = reviews
        .update_review_by_id(other.id, review.review.id, "Bad".to_owned())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "you can only update your own review");
    assert!(matches!(
        reviews.delete_review_by_id(other.id, review.review.id).await,
        Err(AppError::Unauthorized(_))
    ));
    assert_eq!(
        reviews.get_review_by_id(review.review.id).await.unwrap().review.content,
        "Tasty"
    );

    let updated = reviews
        .update_review_by_id(author.id, review.review.id, "Very tasty".to_owned())
        .await
        .unwrap();
    assert_eq!(updated.review.content, "Very tasty");
    reviews
        .delete_review_by_id(author.id, review.review.id)
        .await
        .unwrap();
    assert!(matches!(
        reviews.delete_review_by_id(author.id, review.review.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        reviews.create_review(author.id, i64::MAX, "Ghost".to_owned()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn favorites_are_unique_per_user() {
    let Some(app) = database_app() else { return };
    let owner = register(&app, "owner").await;
    let fan = register(&app, "fan").await;
    let recipe = app
        .ctx
        .recipes
        .create_recipe(owner.id, pasta(), TagRefs::default(), vec![])
        .await
        .unwrap();
    let favorites = &app.ctx.favorites;

    let favorite = favorites.create_favorite(fan.id, recipe.recipe.id).await.unwrap();
    assert!(matches!(
        favorites.create_favorite(fan.id, recipe.recipe.id).await,
        Err(AppError::Conflict(_))
    ));
    assert_eq!(favorites.get_by_user_id(fan.id).await.unwrap().len(), 1);

    favorites.delete_favorite(fan.id, 0).await.unwrap();
    assert!(matches!(
        favorites.delete_favorite(owner.id, favorite.id).await,
        Err(AppError::Unauthorized(_))
    ));
    favorites.delete_favorite(fan.id, favorite.id).await.unwrap();
    assert!(favorites.get_by_user_id(fan.id).await.unwrap().is_empty());
    assert!(matches!(
        favorites.delete_favorite(fan.id, favorite.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn tag_lifecycle() {
    let Some(app) = database_app() else { return };
    let owner = register(&app, "owner").await;
    let tags = &app.ctx.tags;
    let name = unique("spicy");
    let tag = tags.create_tag(format!("  {} ", name)).await.unwrap();
    assert_eq!(tag.name, name);
    assert!(matches!(tags.create_tag(name.clone()).await, Err(AppError::Conflict(_))));
    assert!(matches!(tags.create_tag(" ".to_owned()).await, Err(AppError::Validation(_))));

    let other = tags.create_tag(unique("mild")).await.unwrap();
    assert!(matches!(
        tags.update_tag(other.id, name.clone()).await,
        Err(AppError::Conflict(_))
    ));
    let renamed = tags.update_tag(tag.id, format!("{}-hot", name)).await.unwrap();
    assert_eq!(renamed.id, tag.id);

    let recipe = app
        .ctx
        .recipes
        .create_recipe(
            owner.id,
            pasta(),
            TagRefs {
                ids: vec![tag.id],
                names: vec![],
            },
            vec![],
        )
        .await
        .unwrap();
    tags.delete_tag(tag.id).await.unwrap();
    assert!(app
        .ctx
        .recipes
        .get_recipe_by_id(recipe.recipe.id)
        .await
        .unwrap()
        .tags
        .is_empty());
    assert!(matches!(tags.delete_tag(tag.id).await, Err(AppError::NotFound(_))));
    assert!(matches!(
        tags.update_tag(tag.id, unique("x")).await,
        Err(AppError::NotFound(_))
    ));
    assert!(tags.get_all_tags().await.unwrap().iter().any(|t| t.id == other.id));
}
