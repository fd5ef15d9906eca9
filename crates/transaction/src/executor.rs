//! Executor running an ordered command list as one all-or-nothing unit.

use async_trait::async_trait;

use crate::command::Command;
use crate::error::{CommandError, CompensationFailure, TransactionFailed};
use crate::state::CommandState;

/// Runs commands in order and compensates on the first failure.
///
/// The executor is built for a single forward pass. On failure it undoes the
/// commands that already executed, last first, then returns the caller's
/// failure value `F` (see [`TransactionFailed`]). Compensation is best-effort:
/// an `undo` that fails is logged and reported, and the remaining commands
/// are still undone.
///
/// `TransactionalCommand` is itself a [`Command`], so a transaction can be a
/// step of an outer transaction. Undoing a committed transaction undoes all
/// of its commands in reverse order.
pub struct TransactionalCommand<F> {
    name: String,
    commands: Vec<Box<dyn Command>>,
    failure: F,
    state: CommandState,
}

impl<F> TransactionalCommand<F>
where
    F: Clone + std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
{
    /// Creates an executor over `commands` that fails with `failure`.
    pub fn new(commands: Vec<Box<dyn Command>>, failure: F) -> Self {
        Self::named("transaction", commands, failure)
    }

    /// Like [`TransactionalCommand::new`], with a name for logs.
    pub fn named(name: impl Into<String>, commands: Vec<Box<dyn Command>>, failure: F) -> Self {
        Self {
            name: name.into(),
            commands,
            failure,
            state: CommandState::Pending,
        }
    }

    /// Returns the number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if there are no commands.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the state of each command, in list order.
    pub fn command_states(&self) -> Vec<CommandState> {
        self.commands.iter().map(|c| c.state()).collect()
    }

    /// Executes every command in order.
    ///
    /// On the first failing command, undoes the commands that executed before
    /// it in reverse order and returns the caller-supplied failure. Calling
    /// `run` a second time fails without touching any command.
    #[tracing::instrument(
        skip(self),
        fields(transaction = %self.name, steps = self.commands.len())
    )]
    pub async fn run(&mut self) -> Result<(), TransactionFailed<F>> {
        if !self.state.can_execute() {
            let cause = CommandError::invalid_state(&self.name, "execute", self.state);
            return Err(TransactionFailed::new(
                self.failure.clone(),
                self.name.clone(),
                cause,
                Vec::new(),
            ));
        }

        metrics::counter!("transactions_total").increment(1);
        let started = std::time::Instant::now();

        // Indices of commands that executed successfully, in execution order.
        let mut ledger: Vec<usize> = Vec::with_capacity(self.commands.len());

        for index in 0..self.commands.len() {
            let command = &mut self.commands[index];
            tracing::debug!(step = command.name(), "executing step");

            if let Err(cause) = command.execute().await {
                let failed_step = command.name().to_string();
                tracing::warn!(
                    step = %failed_step,
                    error = %cause,
                    executed = ledger.len(),
                    "transaction step failed, compensating"
                );

                let compensation_failures = self.compensate(&mut ledger).await;
                self.state = CommandState::Failed;

                metrics::counter!("transactions_rolled_back").increment(1);
                metrics::histogram!("transaction_duration_seconds")
                    .record(started.elapsed().as_secs_f64());

                return Err(TransactionFailed::new(
                    self.failure.clone(),
                    failed_step,
                    cause,
                    compensation_failures,
                ));
            }

            ledger.push(index);
        }

        self.state = CommandState::Executed;

        let duration = started.elapsed().as_secs_f64();
        metrics::counter!("transactions_committed").increment(1);
        metrics::histogram!("transaction_duration_seconds").record(duration);
        tracing::info!(duration, "transaction committed");

        Ok(())
    }

    /// Undoes every command of a committed run, last first.
    ///
    /// Commands whose `undo` fails stay `Executed` and the transaction stays
    /// committed, so a later `rollback` retries only those.
    #[tracing::instrument(skip(self), fields(transaction = %self.name))]
    pub async fn rollback(&mut self) -> Result<(), CommandError> {
        if !self.state.can_undo() {
            return Err(CommandError::invalid_state(&self.name, "undo", self.state));
        }

        let mut ledger: Vec<usize> = self
            .commands
            .iter()
            .enumerate()
            .filter(|(_, c)| c.state() == CommandState::Executed)
            .map(|(index, _)| index)
            .collect();

        let failures = self.compensate(&mut ledger).await;
        if !failures.is_empty() {
            return Err(CommandError::Compensation(failures));
        }

        self.state = CommandState::Undone;
        tracing::info!("transaction rolled back");
        Ok(())
    }

    /// Drains `ledger` from the back, undoing each command.
    async fn compensate(&mut self, ledger: &mut Vec<usize>) -> Vec<CompensationFailure> {
        let mut failures = Vec::new();

        while let Some(index) = ledger.pop() {
            let command = &mut self.commands[index];
            match command.undo().await {
                Ok(()) => {
                    tracing::debug!(step = command.name(), "step compensated");
                }
                Err(error) => {
                    tracing::error!(
                        step = command.name(),
                        error = %error,
                        "compensation step failed, continuing"
                    );
                    metrics::counter!("compensation_failures_total").increment(1);
                    failures.push(CompensationFailure {
                        step: command.name().to_string(),
                        error,
                    });
                }
            }
        }

        failures
    }
}

#[async_trait]
impl<F> Command for TransactionalCommand<F>
where
    F: Clone + std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> CommandState {
        self.state
    }

    async fn execute(&mut self) -> Result<(), CommandError> {
        self.run()
            .await
            .map_err(|failed| CommandError::Nested(Box::new(failed)))
    }

    async fn undo(&mut self) -> Result<(), CommandError> {
        self.rollback().await
    }
}
