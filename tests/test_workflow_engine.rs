//! End-to-end workflow runs over mock providers and real local backends

use deskroute::engine::WorkflowEngine;
use deskroute::error::WorkflowError;
use deskroute::routing::{Dispatcher, QualityGate};
use deskroute::search::SearchHit;
use deskroute::specialists::{
    HumanEscalation, OrderSpecialist, SupportSpecialist, WebSearchSpecialist,
};
use deskroute::store::{KnowledgeBase, OrderStore};
use deskroute::testing::{MockLlmProvider, MockWebSearch};
use deskroute::transcript::{AuthorTag, Transcript};
use std::sync::Arc;

const ORDER_SEED: &str = "\
    CREATE TABLE orders (id INTEGER PRIMARY KEY, customer TEXT, status TEXT);\
    INSERT INTO orders VALUES (7, 'dana', 'in transit');";

fn knowledge() -> Arc<KnowledgeBase> {
    let mut kb = KnowledgeBase::new();
    kb.ingest("Refund policy: refunds are available within 30 days of purchase.")
        .unwrap();
    kb.ingest("Data privacy: customer data is never sold to third parties.")
        .unwrap();
    Arc::new(kb)
}

fn full_engine(provider: Arc<MockLlmProvider>) -> WorkflowEngine {
    let store = Arc::new(OrderStore::in_memory_seeded(ORDER_SEED).unwrap());
    let search = Arc::new(MockWebSearch::with_hits(vec![SearchHit {
        title: "Status page".to_string(),
        url: "https://status.example.com".to_string(),
        content: "All systems operational.".to_string(),
    }]));

    WorkflowEngine::new(
        Dispatcher::new(provider.clone(), "test-model"),
        QualityGate::new(provider.clone(), "test-model"),
        Box::new(OrderSpecialist::new(provider.clone(), "test-model", Some(store))),
        Box::new(SupportSpecialist::new(Some(knowledge()))),
        Box::new(WebSearchSpecialist::new(provider, "test-model", Some(search))),
        Box::new(HumanEscalation::new()),
    )
}

#[tokio::test]
async fn order_request_round_trips_through_sql() {
    let provider = Arc::new(MockLlmProvider::scripted(vec![
        r#"{"next": "order", "reason": "Order status question."}"#.to_string(),
        r#"{"query": "SELECT status FROM orders WHERE id = 7"}"#.to_string(),
        "Order 7 is in transit.".to_string(),
        r#"{"next": "FINISH", "reason": "Answered with order status."}"#.to_string(),
    ]));
    let engine = full_engine(provider);
    let mut transcript = Transcript::seeded("Where is order 7?");

    engine.run(&mut transcript).await.unwrap();

    let tags: Vec<AuthorTag> = transcript.messages().iter().map(|m| m.tag).collect();
    assert_eq!(
        tags,
        vec![
            AuthorTag::User,
            AuthorTag::Supervisor,
            AuthorTag::Order,
            AuthorTag::Validator
        ]
    );
    assert_eq!(
        transcript.visible_answer().unwrap().content,
        "Order 7 is in transit."
    );
}

#[tokio::test]
async fn web_search_request_uses_search_results() {
    let provider = Arc::new(MockLlmProvider::scripted(vec![
        r#"{"next": "web_search_node", "reason": "Needs current information."}"#.to_string(),
        "All systems are operational per the status page.".to_string(),
        r#"{"next": "FINISH", "reason": "Current information provided."}"#.to_string(),
    ]));
    let engine = full_engine(provider);
    let mut transcript = Transcript::seeded("Is the service up right now?");

    engine.run(&mut transcript).await.unwrap();

    let answer = transcript.visible_answer().unwrap();
    assert_eq!(answer.tag, AuthorTag::WebSearch);
    assert!(answer.content.contains("operational"));
}

#[tokio::test]
async fn rejected_answer_loops_back_and_recovers() {
    let provider = Arc::new(MockLlmProvider::scripted(vec![
        // First pass: web search gives something off-topic
        r#"{"next": "web_search_node", "reason": "Try the web first."}"#.to_string(),
        "Unrelated trivia.".to_string(),
        r#"{"next": "supervisor", "reason": "Off-topic answer."}"#.to_string(),
        // Second pass: support answers properly
        r#"{"next": "support", "reason": "Policy question after all."}"#.to_string(),
        r#"{"next": "FINISH", "reason": "Policy answered."}"#.to_string(),
    ]));
    let engine = full_engine(provider);
    let mut transcript = Transcript::seeded("What is the refund policy?");

    engine.run(&mut transcript).await.unwrap();

    // Two supervisor rationales, one validator rejection, one acceptance
    let supervisor_count = transcript
        .messages()
        .iter()
        .filter(|m| m.tag == AuthorTag::Supervisor)
        .count();
    assert_eq!(supervisor_count, 2);
    assert_eq!(
        transcript.visible_answer().unwrap().tag,
        AuthorTag::Support
    );
}

#[tokio::test]
async fn escalation_then_resolution() {
    let provider = Arc::new(MockLlmProvider::scripted(vec![
        r#"{"next": "human_node", "reason": "Request is too vague."}"#.to_string(),
        r#"{"next": "support", "reason": "Treat it as a policy question."}"#.to_string(),
        r#"{"next": "FINISH", "reason": "Good enough."}"#.to_string(),
    ]));
    let engine = full_engine(provider);
    let mut transcript = Transcript::seeded("help");

    engine.run(&mut transcript).await.unwrap();

    // The escalation skipped the validator and went straight back to dispatch
    let tags: Vec<AuthorTag> = transcript.messages().iter().map(|m| m.tag).collect();
    let human_index = tags.iter().position(|t| *t == AuthorTag::Human).unwrap();
    assert_eq!(tags[human_index + 1], AuthorTag::Supervisor);
}

#[tokio::test]
async fn budget_exhaustion_reports_configured_cycles() {
    let mut script = Vec::new();
    for _ in 0..8 {
        script.push(r#"{"next": "support", "reason": "Policy."}"#.to_string());
        script.push(r#"{"next": "supervisor", "reason": "Not good enough."}"#.to_string());
    }
    let provider = Arc::new(MockLlmProvider::scripted(script));
    let engine = full_engine(provider).with_max_dispatch_cycles(4);
    let mut transcript = Transcript::seeded("never satisfied");

    let result = engine.run(&mut transcript).await;

    assert!(matches!(
        result,
        Err(WorkflowError::CycleBudgetExhausted { cycles: 4 })
    ));
    // 4 full cycles appended their messages before the abort
    assert_eq!(transcript.len(), 1 + 4 * 3);
}
