#[macro_use]
mod common;

use actix_web::{http::StatusCode, test};
use futures::future::join_all;
use hostelwash_api::{
    error::{is_unique_violation, ApiError},
    models::{new_id, BookingStatus, MachineStatus},
};
use serde_json::{json, Value};
use sqlx::{query, Pool, Sqlite};

use common::{
    count_bookings_on, file_pool, insert_booking, insert_machine, insert_student, test_pool,
};

const DAY: &str = "2024-03-01";

#[actix_web::test]
async fn booking_is_created_and_listed_with_student_details() {
    let pool = test_pool().await;
    let student = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(json!({ "userId": student, "machineId": "WM-01", "date": DAY, "time": "10:00" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(response).await;
    assert_eq!(created["message"], "Booking created");
    assert!(created["id"].as_str().unwrap().starts_with("book-"));

    let request = test::TestRequest::get().uri("/api/bookings").to_request();
    let bookings: Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(bookings.as_array().unwrap().len(), 1);
    assert_eq!(bookings[0]["userName"], "Asha Verma");
    assert_eq!(bookings[0]["userRoom"], "B-204");
    assert_eq!(bookings[0]["status"], "upcoming");

    let request = test::TestRequest::get()
        .uri(&format!("/api/bookings/user/{student}"))
        .to_request();
    let own: Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(own[0]["machineId"], "WM-01");
    assert_eq!(own[0]["time"], "10:00");
}

#[actix_web::test]
async fn second_upcoming_booking_is_rejected() {
    let pool = test_pool().await;
    let student = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    insert_booking(&pool, &student, "WM-01", DAY, "09:00", BookingStatus::Upcoming).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(json!({ "userId": student, "machineId": "WM-01", "date": DAY, "time": "11:00" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "You already have an upcoming booking.");
}

#[actix_web::test]
async fn taken_slot_is_rejected() {
    let pool = test_pool().await;
    let first = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    let second = insert_student(&pool, "Ravi Kumar", "9123456780", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    insert_booking(&pool, &first, "WM-01", DAY, "10:00", BookingStatus::Upcoming).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(json!({ "userId": second, "machineId": "WM-01", "date": DAY, "time": "10:00" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "This slot is no longer available.");
}

#[actix_web::test]
async fn booking_validates_input_and_references() {
    let pool = test_pool().await;
    let student = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(json!({ "userId": student, "machineId": "WM-01", "date": "01/03/2024", "time": "10:00" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::BAD_REQUEST
    );

    let request = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(json!({ "userId": student, "machineId": "WM-99", "date": DAY, "time": "10:00" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::NOT_FOUND
    );

    let request = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(json!({ "userId": "user-missing", "machineId": "WM-01", "date": DAY, "time": "10:00" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn completed_booking_frees_the_student_to_book_again() {
    let pool = test_pool().await;
    let student = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    let booking =
        insert_booking(&pool, &student, "WM-01", DAY, "09:00", BookingStatus::Upcoming).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::put()
        .uri(&format!("/api/bookings/{booking}/status"))
        .set_json(json!({ "status": "completed" }))
        .to_request();
    assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

    let request = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(json!({ "userId": student, "machineId": "WM-01", "date": "2024-03-02", "time": "09:00" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::CREATED
    );

    // Reopening the old booking would give the student two upcoming bookings.
    let request = test::TestRequest::put()
        .uri(&format!("/api/bookings/{booking}/status"))
        .set_json(json!({ "status": "upcoming" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::CONFLICT
    );
}

#[actix_web::test]
async fn cancelling_removes_the_booking() {
    let pool = test_pool().await;
    let student = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    let booking =
        insert_booking(&pool, &student, "WM-01", DAY, "09:00", BookingStatus::Upcoming).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::delete()
        .uri(&format!("/api/bookings/{booking}"))
        .to_request();
    assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);
    assert_eq!(count_bookings_on(&pool, DAY).await, 0);

    let request = test::TestRequest::delete()
        .uri(&format!("/api/bookings/{booking}"))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn slots_cover_business_hours_minus_booked_times() {
    let pool = test_pool().await;
    let student = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    let other = insert_student(&pool, "Ravi Kumar", "9123456780", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    insert_machine(&pool, "WM-02", MachineStatus::Available).await;
    insert_booking(&pool, &student, "WM-01", DAY, "10:00", BookingStatus::Upcoming).await;
    insert_booking(&pool, &other, "WM-02", DAY, "11:00", BookingStatus::Upcoming).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::get()
        .uri(&format!("/api/slots?machineId=WM-01&date={DAY}"))
        .to_request();
    let slots: Value = test::call_and_read_body_json(&app, request).await;
    let slots = slots.as_array().unwrap();

    assert_eq!(slots.len(), 12);
    assert_eq!(slots[0], json!({ "time": "09:00", "available": true }));
    assert_eq!(slots[11]["time"], "20:00");

    let unavailable: Vec<&str> = slots
        .iter()
        .filter(|slot| slot["available"] == false)
        .map(|slot| slot["time"].as_str().unwrap())
        .collect();
    assert_eq!(unavailable, ["10:00"]);
}

#[actix_web::test]
async fn slots_require_machine_and_date() {
    let pool = test_pool().await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::get()
        .uri("/api/slots?machineId=WM-01")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["message"], "Machine ID and date are required.");

    let request = test::TestRequest::get()
        .uri("/api/slots?machineId=WM-01&date=tomorrow")
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_web::test]
async fn stored_settings_reshape_the_slots() {
    let pool = test_pool().await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::put()
        .uri("/api/settings")
        .set_json(json!({ "startTime": "08:00", "endTime": "10:00", "slotDuration": 30 }))
        .to_request();
    assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

    let request = test::TestRequest::get().uri("/api/settings").to_request();
    let settings: Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(
        settings,
        json!({ "startTime": "08:00", "endTime": "10:00", "slotDuration": 30 })
    );

    let request = test::TestRequest::get()
        .uri(&format!("/api/slots?machineId=WM-01&date={DAY}"))
        .to_request();
    let slots: Value = test::call_and_read_body_json(&app, request).await;
    let times: Vec<&str> = slots
        .as_array()
        .unwrap()
        .iter()
        .map(|slot| slot["time"].as_str().unwrap())
        .collect();
    assert_eq!(times, ["08:00", "08:30", "09:00", "09:30"]);
}

#[actix_web::test]
async fn invalid_settings_are_rejected() {
    let pool = test_pool().await;
    let app = spawn_app!(pool.clone());

    for body in [
        json!({ "startTime": "18:00", "endTime": "09:00", "slotDuration": 60 }),
        json!({ "startTime": "09:00", "endTime": "18:00", "slotDuration": 0 }),
        json!({ "startTime": "9am", "endTime": "18:00", "slotDuration": 60 }),
    ] {
        let request = test::TestRequest::put()
            .uri("/api/settings")
            .set_json(body)
            .to_request();
        assert_eq!(
            test::call_service(&app, request).await.status(),
            StatusCode::BAD_REQUEST
        );
    }
}

#[actix_web::test]
async fn blocking_a_date_cancels_its_bookings() {
    let pool = test_pool().await;
    let first = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    let second = insert_student(&pool, "Ravi Kumar", "9123456780", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    insert_booking(&pool, &first, "WM-01", DAY, "09:00", BookingStatus::Upcoming).await;
    insert_booking(&pool, &second, "WM-01", DAY, "10:00", BookingStatus::Completed).await;
    insert_booking(&pool, &second, "WM-01", "2024-03-02", "10:00", BookingStatus::Upcoming).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::post()
        .uri("/api/blocked-dates")
        .set_json(json!({ "date": DAY, "reason": "Plumbing work" }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(response).await;
    assert!(created["id"].as_str().unwrap().starts_with("block-"));
    assert_eq!(created["cancelledBookings"], 2);

    assert_eq!(count_bookings_on(&pool, DAY).await, 0);
    assert_eq!(count_bookings_on(&pool, "2024-03-02").await, 1);

    let request = test::TestRequest::get().uri("/api/blocked-dates").to_request();
    let blocked: Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(blocked[0]["date"], DAY);
    assert_eq!(blocked[0]["reason"], "Plumbing work");

    let request = test::TestRequest::post()
        .uri("/api/blocked-dates")
        .set_json(json!({ "date": DAY }))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::CONFLICT
    );
}

#[actix_web::test]
async fn blocked_date_refuses_bookings_and_shows_no_free_slots() {
    let pool = test_pool().await;
    let student = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    let app = spawn_app!(pool.clone());

    let request = test::TestRequest::post()
        .uri("/api/blocked-dates")
        .set_json(json!({ "date": DAY, "reason": "Holiday" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, request).await;
    let blocked_id = created["id"].as_str().unwrap().to_string();

    let request = test::TestRequest::get()
        .uri(&format!("/api/slots?machineId=WM-01&date={DAY}"))
        .to_request();
    let slots: Value = test::call_and_read_body_json(&app, request).await;
    assert!(slots
        .as_array()
        .unwrap()
        .iter()
        .all(|slot| slot["available"] == false));

    let request = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(json!({ "userId": student, "machineId": "WM-01", "date": DAY, "time": "10:00" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::CONFLICT
    );

    let request = test::TestRequest::delete()
        .uri(&format!("/api/blocked-dates/{blocked_id}"))
        .to_request();
    assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

    let request = test::TestRequest::delete()
        .uri(&format!("/api/blocked-dates/{blocked_id}"))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn booking_time_must_start_a_slot() {
    let pool = test_pool().await;
    let student = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    let app = spawn_app!(pool.clone());

    for time in ["09:30", "21:00", "07:00"] {
        let request = test::TestRequest::post()
            .uri("/api/bookings")
            .set_json(json!({ "userId": student, "machineId": "WM-01", "date": DAY, "time": time }))
            .to_request();
        assert_eq!(
            test::call_service(&app, request).await.status(),
            StatusCode::BAD_REQUEST
        );
    }
    assert_eq!(count_bookings_on(&pool, DAY).await, 0);

    let request = test::TestRequest::put()
        .uri("/api/settings")
        .set_json(json!({ "startTime": "09:00", "endTime": "12:00", "slotDuration": 30 }))
        .to_request();
    assert_eq!(test::call_service(&app, request).await.status(), StatusCode::OK);

    let request = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(json!({ "userId": student, "machineId": "WM-01", "date": DAY, "time": "09:30" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, request).await.status(),
        StatusCode::CREATED
    );

    let request = test::TestRequest::get()
        .uri(&format!("/api/slots?machineId=WM-01&date={DAY}"))
        .to_request();
    let slots: Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(slots[1], json!({ "time": "09:30", "available": false }));
}

async fn insert_raw_booking(
    pool: &Pool<Sqlite>,
    user_id: &str,
    time: &str,
    status: BookingStatus,
) -> Result<(), sqlx::Error> {
    query("INSERT INTO bookings (id, user_id, machine_id, date, time, status) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(new_id("book"))
        .bind(user_id)
        .bind("WM-01")
        .bind(DAY)
        .bind(time)
        .bind(status)
        .execute(pool)
        .await
        .map(|_| ())
}

#[actix_web::test]
async fn unique_indexes_reject_colliding_rows_as_conflicts() {
    let pool = test_pool().await;
    let first = insert_student(&pool, "Asha Verma", "9876543210", "secret").await;
    let second = insert_student(&pool, "Ravi Kumar", "9123456780", "secret").await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    insert_booking(&pool, &first, "WM-01", DAY, "10:00", BookingStatus::Upcoming).await;

    let err = insert_raw_booking(&pool, &second, "10:00", BookingStatus::Upcoming)
        .await
        .unwrap_err();
    assert!(is_unique_violation(&err));
    let mapped = ApiError::conflict_on_unique(err, "This slot is no longer available.");
    assert!(matches!(mapped, ApiError::Conflict(message) if message == "This slot is no longer available."));

    let err = insert_raw_booking(&pool, &first, "11:00", BookingStatus::Upcoming)
        .await
        .unwrap_err();
    assert!(matches!(
        ApiError::conflict_on_unique(err, "taken"),
        ApiError::Conflict(_)
    ));

    insert_raw_booking(&pool, &first, "12:00", BookingStatus::Completed)
        .await
        .unwrap();
    assert_eq!(count_bookings_on(&pool, DAY).await, 2);
}

#[actix_web::test]
async fn concurrent_requests_for_one_slot_yield_one_booking_and_conflicts() {
    let (_directory, pool) = file_pool().await;
    insert_machine(&pool, "WM-01", MachineStatus::Available).await;
    let mut students = Vec::new();
    for index in 0..8 {
        let phone = format!("98765432{index:02}");
        students.push(insert_student(&pool, &format!("Student {index}"), &phone, "secret").await);
    }
    let app = spawn_app!(pool.clone());

    let requests = students.iter().map(|student| {
        let request = test::TestRequest::post()
            .uri("/api/bookings")
            .set_json(json!({ "userId": student, "machineId": "WM-01", "date": DAY, "time": "10:00" }))
            .to_request();
        test::call_service(&app, request)
    });
    let statuses: Vec<StatusCode> = join_all(requests)
        .await
        .iter()
        .map(|response| response.status())
        .collect();

    let created = statuses
        .iter()
        .filter(|status| **status == StatusCode::CREATED)
        .count();
    let conflicts = statuses
        .iter()
        .filter(|status| **status == StatusCode::CONFLICT)
        .count();
    assert_eq!(created, 1, "statuses: {statuses:?}");
    assert_eq!(conflicts, 7, "statuses: {statuses:?}");
    assert_eq!(count_bookings_on(&pool, DAY).await, 1);
}
