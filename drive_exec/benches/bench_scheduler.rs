//! # Scheduler Benchmark

use criterion::{criterion_group, criterion_main, Criterion};
use std::rc::Rc;

use comms_if::{eqpt::hid::Button, tc::Tc};
use drive_lib::{
    drivetrain::{Drivetrain, DrivetrainParams},
    params::ExecParams,
    pid_ctrl::PidParams,
    robot_container::RobotContainer,
    scheduler::Scheduler,
    sim::{ScriptedHid, SimRobot},
};

fn scheduler_benchmark(c: &mut Criterion) {
    // ---- Build the robot from the shipped parameters ----

    let exec_params: ExecParams =
        util::params::from_str(include_str!("../../params/drive_exec.toml")).unwrap();
    let dt_params: DrivetrainParams =
        util::params::from_str(include_str!("../../params/drivetrain.toml")).unwrap();
    let mut turn_params: PidParams =
        util::params::from_str(include_str!("../../params/turn_pid.toml")).unwrap();

    // Zero gains keep the turn running for the whole benchmark
    turn_params.k_p = 0.0;
    turn_params.k_d = 0.0;

    let sim = SimRobot::from_drivetrain_params(
        &dt_params,
        exec_params.sim_max_turn_rate_degs,
        exec_params.sim_counts_per_s,
    );
    let drivetrain = Drivetrain::new(
        Box::new(sim.motor_driver()),
        Box::new(sim.gyro()),
        dt_params,
    )
    .unwrap();

    let hid = ScriptedHid::new();
    let mut scheduler = Scheduler::new(exec_params.cycle_period_s).unwrap();
    let container = RobotContainer::new(
        &mut scheduler,
        drivetrain,
        Rc::new(hid.clone()),
        &turn_params,
        &exec_params,
    )
    .unwrap();

    scheduler.run();
    hid.apply(&Tc::Press {
        button: Button::BumperRight,
    });
    scheduler.run();
    assert!(scheduler.is_running(container.turn_right_cmd));

    // ---- Benchmark ----

    c.bench_function("scheduler tick with a running turn", |b| {
        b.iter(|| {
            scheduler.run();
            sim.step(exec_params.cycle_period_s);

            // Keep the turn alive by restarting it before it times out
            if !scheduler.is_running(container.turn_right_cmd) {
                scheduler.schedule(container.turn_right_cmd).unwrap();
            }
        })
    });
}

criterion_group!(benches, scheduler_benchmark);
criterion_main!(benches);
