pub mod prelude;

use prelude::*;

use std::error::Error;

async fn demonstrate_fields<R: DeviceTransfer>(program: &Program<R>) -> Result<(), FieldError> {
    let f = program.field(PrimitiveKind::I32, vec![10])?;
    let values: Vec<f64> = range(10).into_iter().map(|i| i as f64).collect();

    f.from_array_1d(program, &values).await?;

    println!("Scalar field [10]: {:?}", f.to_array_1d(program).await?);

    if let Some(number) = f.get(program, &[3]).await?.as_number() {
        println!("Scalar field [10] at [3]: {}", number);
    }

    let v = program.vector_field(2, PrimitiveKind::I32, vec![3, 3])?;

    for index in ndrange(v.dimensions()) {
        let base = (index[0] * 10 + index[1]) as f64;

        v.set(program, &index, &Value::from([base, base + 10000.0]))
            .await?;
    }

    v.set(program, &[1, 1], &Value::from([7.0, 8.0])).await?;

    println!("Vector field [3, 3] at [1, 1]: {:?}", v.get(program, &[1, 1]).await?);
    println!("Vector field [3, 3] flat: {:?}", v.to_array_1d(program).await?);

    let particles = program.struct_field(
        [
            ("pos", ElementType::vector(PrimitiveKind::F32, 2)?),
            ("id", ElementType::scalar(PrimitiveKind::I32)),
        ],
        vec![2],
    )?;

    particles
        .from_array(
            program,
            &NdArray::from(vec![
                Value::record([("pos", Value::from([0.5, 1.5])), ("id", Value::from(1))]),
                Value::record([("pos", Value::from([-1.0, 2.25])), ("id", Value::from(2))]),
            ]),
        )
        .await?;

    println!("Struct field [2]: {:?}", particles.to_array(program).await?);

    Ok(())
}

async fn run() -> Result<(), Box<dyn Error>> {
    let config = RuntimeConfig::from_env();

    match config.backend {
        Backend::Gpu => {
            let runtime = GpuRuntime::new(&config).await?;

            runtime.gpu().print_info();

            let program = Program::new(runtime);

            demonstrate_fields(&program).await?;

            let texture = program.texture(PrimitiveKind::F32, 4, vec![64, 64])?;
            let allocated = program.runtime().gpu().create_texture(&texture.descriptor());

            println!(
                "Texture {:?}: {:?} {}x{}",
                texture.handle(),
                allocated.format(),
                allocated.width(),
                allocated.height()
            );
        }
        Backend::Host => {
            println!("Using host runtime");
            demonstrate_fields(&Program::new(HostRuntime::with_config(&config))).await?;
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = pollster::block_on(run()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
