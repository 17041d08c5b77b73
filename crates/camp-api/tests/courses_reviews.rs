mod common;

use axum::http::{Method, StatusCode};
use common::{BOSTON, TestApp};
use serde_json::{Value, json};

fn course(title: &str, tuition: u32) -> Value {
    json!({
        "title": title,
        "description": "Covers the basics",
        "weeks": "8",
        "tuition": tuition,
        "minimumSkill": "beginner",
    })
}

#[tokio::test]
async fn courses_keep_average_cost_current() {
    let app = TestApp::new();
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await;
    let other = app.register("Other", "other@gmail.com", "publisher").await;
    let id = app.bootcamp(&owner, "Devworks Bootcamp", BOSTON).await;
    let courses = format!("/api/v1/bootcamps/{id}/courses");

    let (status, body) = app
        .send(Method::POST, &courses, Some(&other), Some(course("Sneaky", 1000)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"].as_str().unwrap(),
        format!(
            "User {} is not authorized to add a course to bootcamp {id}",
            app.get("/api/v1/auth/me", Some(&other)).await.1["data"]["_id"]
                .as_str()
                .unwrap()
        )
    );

    let (status, body) = app
        .send(Method::POST, &courses, Some(&owner), Some(course("Front End", 8000)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["weeks"], 8);
    let first = body["data"]["_id"].as_str().unwrap().to_string();
    let (status, _) = app
        .send(Method::POST, &courses, Some(&owner), Some(course("Back End", 10500)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let camp = format!("/api/v1/bootcamps/{id}");
    assert_eq!(app.get(&camp, None).await.1["data"]["averageCost"], 9250);

    let (status, body) = app.get(&courses, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);

    let (status, body) = app.get(&format!("/api/v1/courses/{first}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"]["bootcamp"],
        json!({
            "_id": id,
            "name": "Devworks Bootcamp",
            "description": "Devworks Bootcamp teaches full stack development",
        })
    );

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/courses/{first}"),
            Some(&owner),
            Some(json!({ "tuition": 12500 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.get(&camp, None).await.1["data"]["averageCost"], 11500);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/v1/courses/{first}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/v1/courses/{first}"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.get(&camp, None).await.1["data"]["averageCost"], 10500);
}

#[tokio::test]
async fn course_validation_errors() {
    let app = TestApp::new();
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await;
    let id = app.bootcamp(&owner, "Devworks Bootcamp", BOSTON).await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/bootcamps/{id}/courses"),
            Some(&owner),
            Some(json!({ "title": "Bad", "description": "d", "weeks": 0, "tuition": -1, "minimumSkill": "guru" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Weeks must be at least 1"), "{error}");
    assert!(error.contains("Tuition can not be negative"), "{error}");
}

#[tokio::test]
async fn one_review_per_user_and_average_rating() {
    let app = TestApp::new();
    let publisher = app.register("Pub", "pub@gmail.com", "publisher").await;
    let first = app.register("First", "first@gmail.com", "user").await;
    let second = app.register("Second", "second@gmail.com", "user").await;
    let id = app.bootcamp(&publisher, "Devworks Bootcamp", BOSTON).await;
    let reviews = format!("/api/v1/bootcamps/{id}/reviews");
    let review = |rating: u32| json!({ "title": "Nice", "text": "Solid program", "rating": rating });

    let (status, _) = app
        .send(Method::POST, &reviews, Some(&publisher), Some(review(5)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(Method::POST, &reviews, Some(&first), Some(review(8)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let review_id = body["data"]["_id"].as_str().unwrap().to_string();

    let (status, _) = app
        .send(Method::POST, &reviews, Some(&first), Some(review(2)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::POST, &reviews, Some(&second), Some(review(5)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let camp = format!("/api/v1/bootcamps/{id}");
    assert_eq!(app.get(&camp, None).await.1["data"]["averageRating"], 6.5);

    let (status, body) = app
        .send(Method::POST, &reviews, Some(&second), Some(json!({ "title": "x", "text": "y", "rating": 11 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/v1/reviews/{review_id}"), Some(&second), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/v1/reviews/{review_id}"), Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.get(&camp, None).await.1["data"]["averageRating"], 5.0);

    let (_, body) = app.get("/api/v1/reviews?rating[gte]=5", None).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["bootcamp"]["name"], "Devworks Bootcamp");
}

#[tokio::test]
async fn users_are_admin_only_and_hide_secrets() {
    let app = TestApp::new();
    let user = app.register("User", "user@gmail.com", "user").await;
    let (status, _) = app.get("/api/v1/users", Some(&user)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.admin().await;
    let (status, body) = app.get("/api/v1/users?sort=email", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert!(body["data"][0].get("password").is_none());
    assert_eq!(body["data"][0]["email"], "admin@gmail.com");

    let (status, _) = app.get("/api/v1/users?password=x", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app.get("/api/v1/users?select=password", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/users",
            Some(&admin),
            Some(json!({ "name": "Staff", "email": "staff@gmail.com", "password": "123456", "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "admin");
    let staff = body["data"]["_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/users/{staff}"),
            Some(&admin),
            Some(json!({ "name": "Staff Member" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Staff Member");

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/v1/users/{staff}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/v1/users/{staff}"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn course_listing_filters_selects_sorts_and_pages() {
    let app = TestApp::new();
    let owner = app.register("Owner", "owner@gmail.com", "publisher").await;
    let id = app.bootcamp(&owner, "Devworks Bootcamp", BOSTON).await;
    let courses = format!("/api/v1/bootcamps/{id}/courses");
    for (title, tuition) in [
        ("Intro", 8000),
        ("Front End", 9000),
        ("Back End", 12000),
        ("Full Stack", 15000),
        ("Data Science", 20000),
    ] {
        let (status, _) = app
            .send(Method::POST, &courses, Some(&owner), Some(course(title, tuition)))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .get(
            "/api/v1/courses?tuition%5Bgt%5D=10000&select=title,tuition&sort=-tuition&page=2&limit=2",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["count"], 1);
    assert_eq!(body["pagination"], json!({ "prev": { "page": 1, "limit": 2 } }));
    let only = &body["data"][0];
    assert_eq!(only["title"], "Back End");
    assert_eq!(only["tuition"], 12000);
    assert!(only["_id"].is_string());
    assert!(only.get("description").is_none());
    assert!(only.get("weeks").is_none());

    let (_, body) = app
        .get("/api/v1/courses?tuition%5Bgt%5D=10000&sort=-tuition&limit=2", None)
        .await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["pagination"], json!({ "next": { "page": 2, "limit": 2 } }));
    assert_eq!(body["data"][0]["title"], "Data Science");
    assert_eq!(body["data"][0]["bootcamp"]["name"], "Devworks Bootcamp");
}
