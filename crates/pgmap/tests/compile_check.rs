//! Compile-only tests for the execution API.
//!
//! These verify that the async surfaces compile against real client types.
//! They do NOT execute against a database — they only check types and
//! signatures.

#![allow(dead_code)]

use futures_util::StreamExt;
use pgmap::prelude::*;

pgmap::model! {
    struct CompileUser in "compile_users" {
        id: i64 [generated],
        name: String,
        email: String,
    }
}

async fn compile_query_execution(
    cx: &Registry,
    client: &tokio_postgres::Client,
) -> MapResult<()> {
    let all: Vec<CompileUser> = Query::table::<CompileUser>(cx)
        .filter(col(0, "name").ne(""))
        .fetch_all(cx, client)
        .await?;
    let _ = all;

    let one: CompileUser = Query::table::<CompileUser>(cx)
        .filter(col(0, "id").eq(1i64))
        .first(cx, client)
        .await?;
    let _ = one;

    let maybe: Option<CompileUser> = Query::table::<CompileUser>(cx)
        .filter(col(0, "id").eq(1i64))
        .first_opt(cx, client)
        .await?;
    let _ = maybe;

    let n: i64 = Query::table::<CompileUser>(cx)
        .select([("n", count())])
        .first(cx, client)
        .await?;
    let _ = n;

    Ok(())
}

async fn compile_streaming(cx: &Registry, client: &tokio_postgres::Client) -> MapResult<()> {
    let mut stream = Query::table::<CompileUser>(cx)
        .fetch_stream::<CompileUser, _>(cx, client)
        .await?;
    while let Some(user) = stream.next().await {
        let _ = user?;
    }
    Ok(())
}

async fn compile_inside_transaction(
    cx: &Registry,
    tx: &tokio_postgres::Transaction<'_>,
) -> MapResult<u64> {
    Insert::<CompileUser>::new(cx)
        .row(
            cx,
            &CompileUser {
                id: 0,
                name: "a".into(),
                email: "a@b.c".into(),
            },
        )?
        .execute(tx)
        .await?;

    Update::table::<CompileUser>(cx)
        .set("name", "b")
        .filter(col(0, "id").eq(1i64))
        .execute(cx, tx)
        .await?;

    Delete::table::<CompileUser>(cx)
        .filter(col(0, "id").eq(1i64))
        .execute(cx, tx)
        .await
}

async fn compile_generic_over_client<C: GenericClient>(
    cx: &Registry,
    conn: &C,
) -> MapResult<Vec<CompileUser>> {
    Query::table::<CompileUser>(cx).fetch_all(cx, conn).await
}

#[test]
fn api_signatures_compile() {
    // Nothing to run; the async fns above are the assertion.
}
