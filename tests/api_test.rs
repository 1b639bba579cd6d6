use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use dropout_risk::api;
use dropout_risk::artifacts::PerformanceMetrics;
use dropout_risk::model::LogisticModel;
use dropout_risk::{FeatureLayout, ModelBundle};
use serde_json::{json, Value};

const FEATURES: [&str; 4] = [
    "Age_at_enrollment",
    "Tuition_fees_up_to_date",
    "Curricular_units_1st_sem_grade",
    "Curricular_units_2nd_sem_grade",
];

/// Risk rises with age and falls with fees paid and semester grades.
fn complete_bundle() -> ModelBundle {
    let layout = FeatureLayout::new(FEATURES.iter().map(|name| name.to_string()).collect()).unwrap();
    let metrics: PerformanceMetrics = [("accuracy", 0.87), ("f1_score", 0.81)].into_iter().collect();
    ModelBundle::complete(
        Box::new(LogisticModel::new(vec![0.2, -2.0, -0.3, -0.3], 1.0)),
        None,
        layout,
        metrics,
    )
    .with_model_name(Some("Logistic Regression".to_string()))
}

macro_rules! app {
    ($bundle:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($bundle))
                .configure(api::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health() {
    let app = app!(ModelBundle::not_found());
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_status_reports_load_error() {
    let app = app!(ModelBundle::load_error("bad bundle"));
    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/model/status").to_request(),
    )
    .await;

    assert_eq!(body["status"], "error");
    assert_eq!(body["ready"], false);
    assert_eq!(body["detail"], "bad bundle");
}

#[actix_web::test]
async fn test_model_info() {
    let app = app!(complete_bundle());
    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/model/info").to_request(),
    )
    .await;

    assert_eq!(body["status"], "complete");
    assert_eq!(body["model_name"], "Logistic Regression");
    assert_eq!(body["feature_count"], 4);
    assert_eq!(body["performance_metrics"]["f1_score"], 0.81);
    assert_eq!(body["has_scaler"], false);
}

#[actix_web::test]
async fn test_predict_without_model_is_unavailable() {
    let app = app!(ModelBundle::not_found());
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"Age_at_enrollment": 20}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_predict_high_risk() {
    let app = app!(complete_bundle());
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({
            "Age_at_enrollment": 30,
            "Tuition_fees_up_to_date": "No",
            "Curricular_units_1st_sem_grade": 5.0,
            "Curricular_units_2nd_sem_grade": 4.0,
            "Not_a_feature": 12
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["risk_level"], "high");
    assert_eq!(body["headline"], "HIGH RISK");
    assert_eq!(body["recommendations"][0], "Contact student within 24 hours");
    assert!(body["dropout_risk"].as_f64().unwrap() > 0.7);
    assert!(body.get("risk_factors").is_none());
}

#[actix_web::test]
async fn test_predict_rejects_bad_flag() {
    let app = app!(complete_bundle());
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"Tuition_fees_up_to_date": "Sometimes"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("Tuition_fees_up_to_date"));
}

#[actix_web::test]
async fn test_predict_student_low_risk_with_factors() {
    let app = app!(complete_bundle());
    let req = test::TestRequest::post()
        .uri("/predict/student")
        .set_json(json!({
            "age_at_enrollment": 19,
            "gender": "Female",
            "marital_status": 1,
            "tuition_fees_up_to_date": "Yes",
            "scholarship_holder": "Yes",
            "previous_qualification_grade": 140.0,
            "admission_grade": 150.0,
            "first_semester_grade": 16.0,
            "second_semester_grade": 9.5
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["risk_level"], "low");
    assert_eq!(body["message"], "Continue monitoring");
    assert_eq!(body["risk_factors"], json!(["Low 2nd semester grade"]));
}

#[actix_web::test]
async fn test_predict_student_out_of_range() {
    let app = app!(complete_bundle());
    let req = test::TestRequest::post()
        .uri("/predict/student")
        .set_json(json!({
            "age_at_enrollment": 19,
            "gender": "Female",
            "marital_status": 9,
            "tuition_fees_up_to_date": "Yes",
            "scholarship_holder": "No",
            "previous_qualification_grade": 140.0,
            "admission_grade": 150.0,
            "first_semester_grade": 16.0,
            "second_semester_grade": 12.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_fallback_dimension_mismatch_is_unprocessable() {
    let app = app!(ModelBundle::basic(
        Box::new(LogisticModel::new(vec![0.1; 10], 0.0)),
        None
    ));
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"a": 1, "b": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // the next request is unaffected
    let values: serde_json::Map<String, Value> = (0..10).map(|i| (format!("f{}", i), json!(0))).collect();
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(Value::Object(values))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["dropout_risk"], 0.5);
    assert_eq!(body["risk_level"], "medium");
}

#[actix_web::test]
async fn test_batch_predict_isolates_bad_rows() {
    let app = app!(complete_bundle());
    let csv = "name,Age_at_enrollment,Tuition_fees_up_to_date,Curricular_units_1st_sem_grade,Curricular_units_2nd_sem_grade\n\
               Denis Lemayian,19,Yes,16,15\n\
               Kukutia Johnson,31,maybe,4,3\n\
               David Lemoita,30,No,5,4\n";
    let req = test::TestRequest::post()
        .uri("/batch-predict")
        .insert_header(("content-type", "text/csv"))
        .set_payload(csv)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total"], 3);
    assert_eq!(body["summary"]["succeeded"], 2);
    assert_eq!(body["summary"]["failed"], 1);
    assert_eq!(body["summary"]["low_risk"], 1);
    assert_eq!(body["summary"]["high_risk"], 1);
    assert_eq!(body["predictions"][0]["name"], "Denis Lemayian");
    assert_eq!(body["predictions"][0]["risk_level"], "low");
    assert!(body["predictions"][1]["error"].as_str().unwrap().contains("maybe"));
    assert_eq!(body["predictions"][2]["risk_level"], "high");
}

#[actix_web::test]
async fn test_batch_predict_empty_is_bad_request() {
    let app = app!(complete_bundle());
    let req = test::TestRequest::post()
        .uri("/batch-predict")
        .set_payload("name,Age_at_enrollment\n")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
