use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vibeql::catalog::{ColumnInfo, MemoryTable, TableSource};
use vibeql::executor::{
    AggregateFunction, AggregateSpec, FilterExecutor, JoinType, SortKey,
};
use vibeql::expression::SubqueryShape;
use vibeql::window::WindowFunctionSpec;
use vibeql::{
    Datum, Engine, Environment, ErrorKind, ExecResult, ExecutionConfig, Executor, ExecutorState,
    Expression, Kind, PhysicalPlan, Row,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn customers() -> anyhow::Result<Arc<dyn TableSource>> {
    let table = MemoryTable::new(
        "customers",
        vec![ColumnInfo::new("id", Kind::Int), ColumnInfo::new("name", Kind::String)],
    )
    .with_rows(vec![
        vec![Datum::int(1), Datum::string("Alice")],
        vec![Datum::int(2), Datum::string("Bob")],
        vec![Datum::int(3), Datum::string("Carol")],
    ])?;
    Ok(Arc::new(table))
}

fn orders() -> anyhow::Result<Arc<dyn TableSource>> {
    let table = MemoryTable::new(
        "orders",
        vec![
            ColumnInfo::new("customer_id", Kind::Int),
            ColumnInfo::new("amount", Kind::Int),
        ],
    )
    .with_rows(vec![
        vec![Datum::int(1), Datum::int(30)],
        vec![Datum::int(2), Datum::int(5)],
        vec![Datum::int(1), Datum::int(12)],
        vec![Datum::int(1), Datum::null()],
    ])?;
    Ok(Arc::new(table))
}

fn first_column(rows: &[Row]) -> Vec<Datum> {
    rows.iter().filter_map(|row| row.get(0).cloned()).collect()
}

#[test]
fn test_order_by_unknowns_and_nan() -> anyhow::Result<()> {
    init_logger();
    let input = Datum::bag(vec![
        Datum::missing(),
        Datum::int(3),
        Datum::null(),
        Datum::double(1.0),
        Datum::double(f64::NAN),
    ]);
    let plan = PhysicalPlan::scan(Expression::literal(input))
        .sort(vec![SortKey::asc(Expression::column(0))]);

    let values = first_column(&Engine::default().execute(&plan)?);
    assert_eq!(values.len(), 5);
    assert!(matches!(values[0], Datum::Double(v) if v.is_nan()));
    assert_eq!(values[1], Datum::double(1.0));
    assert_eq!(values[2], Datum::int(3));
    // NULL and MISSING tie; the stable sort keeps their input order.
    assert!(values[3].is_missing());
    assert!(values[4].is_null());
    Ok(())
}

#[test]
fn test_strict_and_permissive_modes() -> anyhow::Result<()> {
    init_logger();
    // SELECT VALUE x + 1 FROM <<1, 'a'>> AS x
    let plan = PhysicalPlan::scan(Expression::literal(Datum::bag(vec![
        Datum::int(1),
        Datum::string("a"),
    ])))
    .project(vec![Expression::add_expr(Expression::column(0), Expression::literal(1))]);

    let err = Engine::new(ExecutionConfig::strict()).execute(&plan).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(!err.is_fatal());

    let values = first_column(&Engine::new(ExecutionConfig::permissive()).execute(&plan)?);
    assert_eq!(values[0], Datum::int(2));
    assert!(values[1].is_missing());
    Ok(())
}

#[test]
fn test_config_from_json() -> anyhow::Result<()> {
    let config: ExecutionConfig = serde_json::from_str(r#"{"mode": "strict"}"#)?;
    let engine = Engine::new(config);
    let overflow = Expression::cast(Expression::literal(1000), Kind::TinyInt);
    assert_eq!(
        engine.evaluate(&overflow).unwrap_err().kind(),
        ErrorKind::NumericValueOutOfRange
    );
    assert!(Engine::default().evaluate(&overflow)?.is_missing());
    Ok(())
}

#[test]
fn test_correlated_scalar_subquery() -> anyhow::Result<()> {
    init_logger();
    // SELECT c.name, (SELECT COUNT(*) FROM orders o WHERE o.customer_id = c.id)
    // FROM customers c
    let order_count = PhysicalPlan::table_scan(orders()?)
        .filter(Expression::eq(Expression::column(0), Expression::variable(1, 0)))
        .aggregate(vec![], vec![AggregateSpec::count_star()]);
    let plan = PhysicalPlan::table_scan(customers()?).project(vec![
        Expression::column(1),
        Expression::subquery(order_count, SubqueryShape::Scalar),
    ]);

    let rows = Engine::new(ExecutionConfig::strict()).execute(&plan)?;
    assert_eq!(
        rows,
        vec![
            Row::new(vec![Datum::string("Alice"), Datum::bigint(3)]),
            Row::new(vec![Datum::string("Bob"), Datum::bigint(1)]),
            Row::new(vec![Datum::string("Carol"), Datum::bigint(0)]),
        ]
    );
    Ok(())
}

#[test]
fn test_exists_subquery_filter() -> anyhow::Result<()> {
    // SELECT VALUE c.name FROM customers c
    // WHERE EXISTS (SELECT * FROM orders o WHERE o.customer_id = c.id AND o.amount > 10)
    let big_orders = PhysicalPlan::table_scan(orders()?).filter(Expression::and(
        Expression::eq(Expression::column(0), Expression::variable(1, 0)),
        Expression::gt(Expression::column(1), Expression::literal(10)),
    ));
    let plan = PhysicalPlan::table_scan(customers()?)
        .filter(Expression::subquery(big_orders, SubqueryShape::Exists))
        .project(vec![Expression::column(1)]);

    let names = first_column(&Engine::default().execute(&plan)?);
    assert_eq!(names, vec![Datum::string("Alice")]);
    Ok(())
}

#[test]
fn test_join_group_and_sort() -> anyhow::Result<()> {
    init_logger();
    // SELECT c.name, SUM(o.amount) AS total FROM customers c
    // LEFT JOIN orders o ON o.customer_id = c.id
    // GROUP BY c.name ORDER BY total DESC
    let plan = PhysicalPlan::join(
        PhysicalPlan::table_scan(customers()?),
        PhysicalPlan::table_scan(orders()?),
        JoinType::LeftOuter,
        Some(Expression::eq(Expression::column(0), Expression::column(2))),
        2,
    )
    .aggregate(
        vec![Expression::column(1)],
        vec![AggregateSpec::new(AggregateFunction::Sum, Expression::column(3))],
    )
    .sort(vec![SortKey::desc(Expression::column(1))]);

    let rows = Engine::default().execute(&plan)?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], Row::new(vec![Datum::string("Alice"), Datum::bigint(42)]));
    assert_eq!(rows[1], Row::new(vec![Datum::string("Bob"), Datum::bigint(5)]));
    assert_eq!(rows[2].get(0), Some(&Datum::string("Carol")));
    assert!(rows[2].get(1).is_some_and(Datum::is_null));
    Ok(())
}

#[test]
fn test_window_over_table() -> anyhow::Result<()> {
    // SELECT *, RANK() OVER (PARTITION BY customer_id ORDER BY amount DESC)
    let plan = PhysicalPlan::table_scan(orders()?).window(
        vec![Expression::column(0)],
        vec![SortKey::desc(Expression::column(1))],
        vec![WindowFunctionSpec::Rank],
    );
    let rows = Engine::default().execute(&plan)?;
    let ranks: Vec<(Datum, Datum, Datum)> = rows
        .iter()
        .map(|row| {
            (
                row.values()[0].clone(),
                row.values()[1].clone(),
                row.values()[2].clone(),
            )
        })
        .collect();
    assert_eq!(ranks[0], (Datum::int(1), Datum::int(30), Datum::bigint(1)));
    assert_eq!(ranks[1], (Datum::int(1), Datum::int(12), Datum::bigint(2)));
    assert!(ranks[2].1.is_null());
    assert_eq!(ranks[2].2, Datum::bigint(3));
    assert_eq!(ranks[3], (Datum::int(2), Datum::int(5), Datum::bigint(1)));
    Ok(())
}

#[test]
fn test_environment_scoping() {
    let outer = Environment::empty().push(Row::new(vec![Datum::int(10), Datum::int(11)]));
    let inner = outer.push(Row::new(vec![Datum::string("x")]));
    assert_eq!(inner.lookup(0, 0), Some(&Datum::string("x")));
    assert_eq!(inner.lookup(1, 1), outer.lookup(0, 1));
    assert_eq!(outer.depth(), 1);
}

#[test]
fn test_close_twice_and_read_past_end() -> anyhow::Result<()> {
    let plan = PhysicalPlan::table_scan(customers()?).limit(1);
    let mut root = plan.build(ExecutionConfig::default());
    root.open(&Environment::empty())?;
    assert!(root.next_row()?.is_some());
    assert!(!root.has_next()?);

    let err = root.next().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IteratorMisuse);
    assert!(err.is_fatal());

    let err = root.open(&Environment::empty()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IteratorMisuse);

    root.close();
    root.close();
    assert_eq!(root.state(), ExecutorState::Closed);
    Ok(())
}

/// Child whose `open` fails, counting the closes it receives.
struct FailingChild {
    closes: Arc<AtomicUsize>,
    state: ExecutorState,
}

impl Executor for FailingChild {
    fn open(&mut self, _env: &Environment) -> ExecResult<()> {
        Err(anyhow::anyhow!("cannot acquire input").into())
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        Ok(false)
    }

    fn next(&mut self) -> ExecResult<Row> {
        Err(anyhow::anyhow!("no rows").into())
    }

    fn close(&mut self) {
        if self.state != ExecutorState::Closed {
            self.state = ExecutorState::Closed;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn state(&self) -> ExecutorState {
        self.state
    }
}

#[test]
fn test_child_failing_to_open_is_closed_once() {
    let closes = Arc::new(AtomicUsize::new(0));
    let child = FailingChild {
        closes: Arc::clone(&closes),
        state: ExecutorState::Unopened,
    };
    let mut filter = FilterExecutor::new(
        Box::new(child),
        Expression::literal(true),
        ExecutionConfig::default(),
    );

    let err = filter.open(&Environment::empty()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Internal);
    assert!(err.message().contains("cannot acquire input"));

    filter.close();
    filter.close();
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(filter.state(), ExecutorState::Closed);
}

#[test]
fn test_stream_closes_on_drop() -> anyhow::Result<()> {
    let plan = PhysicalPlan::table_scan(customers()?);
    let mut stream = Engine::default().stream(&plan)?;
    assert!(stream.next().is_some());
    drop(stream);
    Ok(())
}
